//! Software present path: one frame through a shared-memory buffer.
//!
//! No double buffering. The frame is filled on the CPU, attached, damaged,
//! committed and flushed, and every local resource (mapping, descriptor,
//! buffer, pool) is released before the function returns. The anonymous
//! backing stays valid until the descriptor closes.

use crate::error::{ClientError, Result};
use crate::wayland::ClientState;
use log::info;
use std::ffi::c_void;
use std::os::fd::{AsFd, AsRawFd, FromRawFd, OwnedFd};
use wayland_client::protocol::{wl_shm, wl_surface::WlSurface};
use wayland_client::{Connection, DispatchError, QueueHandle};

const BYTES_PER_PIXEL: u32 = 4; // ARGB8888

pub(crate) fn stride_for(width: u32) -> u32 {
    width * BYTES_PER_PIXEL
}

pub(crate) fn size_for(width: u32, height: u32) -> usize {
    (stride_for(width) * height) as usize
}

/// Deterministic test card: each pixel is an opaque gray whose luma is the
/// XOR of its coordinates.
pub(crate) fn fill_pattern(pixels: &mut [u32], width: u32, height: u32) {
    for y in 0..height {
        for x in 0..width {
            let luma = (x ^ y) & 0xff;
            pixels[(y * width + x) as usize] = 0xFF00_0000 | (luma << 16) | (luma << 8) | luma;
        }
    }
}

/// Read/write shared mapping of the frame's backing file.
struct ShmMap {
    ptr: *mut u8,
    len: usize,
}

impl ShmMap {
    fn new(fd: &OwnedFd, len: usize) -> Result<Self> {
        let ptr = unsafe {
            libc::mmap(
                std::ptr::null_mut(),
                len,
                libc::PROT_READ | libc::PROT_WRITE,
                libc::MAP_SHARED,
                fd.as_raw_fd(),
                0,
            )
        };
        if ptr == libc::MAP_FAILED {
            return Err(ClientError::ShmSetup(std::io::Error::last_os_error()));
        }
        Ok(Self {
            ptr: ptr as *mut u8,
            len,
        })
    }

    fn as_pixels(&mut self) -> &mut [u32] {
        unsafe { std::slice::from_raw_parts_mut(self.ptr as *mut u32, self.len / 4) }
    }
}

impl Drop for ShmMap {
    fn drop(&mut self) {
        if !self.ptr.is_null() && self.len > 0 {
            unsafe { libc::munmap(self.ptr as *mut c_void, self.len) };
        }
    }
}

/// Anonymously-backed descriptor sized with ftruncate to hold one frame.
fn create_shm_fd(size: usize) -> Result<OwnedFd> {
    let fd = unsafe { libc::memfd_create(c"rhomb-shm".as_ptr(), libc::MFD_CLOEXEC) };
    if fd < 0 {
        return Err(ClientError::ShmSetup(std::io::Error::last_os_error()));
    }
    let owned = unsafe { OwnedFd::from_raw_fd(fd) };
    if unsafe { libc::ftruncate(fd, size as libc::off_t) } < 0 {
        return Err(ClientError::ShmSetup(std::io::Error::last_os_error()));
    }
    Ok(owned)
}

/// Fills a shared-memory buffer with the pattern and presents it once.
pub fn present_pattern(
    conn: &Connection,
    qh: &QueueHandle<ClientState>,
    shm: &wl_shm::WlShm,
    surface: &WlSurface,
    width: u32,
    height: u32,
) -> Result<()> {
    let stride = stride_for(width);
    let size = size_for(width, height);

    let fd = create_shm_fd(size)?;
    let mut map = ShmMap::new(&fd, size)?;
    fill_pattern(map.as_pixels(), width, height);

    let pool = shm.create_pool(fd.as_fd(), size as i32, qh, ());
    let buffer = pool.create_buffer(
        0,
        width as i32,
        height as i32,
        stride as i32,
        wl_shm::Format::Argb8888,
        qh,
        (),
    );

    surface.attach(Some(&buffer), 0, 0);
    surface.damage(0, 0, width as i32, height as i32);
    surface.commit();
    conn.flush().map_err(DispatchError::Backend)?;

    // Local resources go before return: mapping, then descriptor, then the
    // protocol objects. The compositor keeps the committed buffer contents.
    drop(map);
    drop(fd);
    buffer.destroy();
    pool.destroy();

    info!("software frame presented ({width}x{height}, {size} bytes)");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_sizing() {
        assert_eq!(stride_for(320), 1280);
        assert_eq!(size_for(320, 320), 409_600);
    }

    #[test_log::test]
    fn pattern_is_deterministic_and_opaque() {
        let (w, h) = (16u32, 16u32);
        let mut a = vec![0u32; (w * h) as usize];
        let mut b = vec![0u32; (w * h) as usize];
        fill_pattern(&mut a, w, h);
        fill_pattern(&mut b, w, h);
        assert_eq!(a, b);
        assert!(a.iter().all(|px| px >> 24 == 0xff));
    }

    #[test]
    fn pattern_values_follow_the_xor_formula() {
        let (w, h) = (8u32, 8u32);
        let mut pixels = vec![0u32; (w * h) as usize];
        fill_pattern(&mut pixels, w, h);

        assert_eq!(pixels[0], 0xFF00_0000); // (0,0): luma 0
        assert_eq!(pixels[1], 0xFF01_0101); // (1,0): luma 1
        assert_eq!(pixels[(3 * w + 5) as usize], 0xFF06_0606); // 5^3 = 6
        // XOR is symmetric in x and y.
        assert_eq!(pixels[(2 * w + 7) as usize], pixels[(7 * w + 2) as usize]);
    }
}
