//! C ABI over raw CSR arrays.
//!
//! Return codes: `-1` empty graph, `-2` node out of range, `-3` null pointer,
//! `-4` malformed CSR. Non-negative values are results.

use core::slice;

use crate::csr::Csr;
use crate::graph::NodeId;
use crate::star::{sd_star, StarScratch};

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct StarInfo {
    pub scanned: u64,   // arcs scanned by the search
    pub deletable: u32, // center edges reported deletable
    pub error_code: i32, // 0 == success
}

#[no_mangle]
pub extern "C" fn stp_paths_version() -> u32 { 1 }

/// Star search around `center`. `out_deletable` has one byte per arc of the
/// center's row in the caller's order (`offsets[center]..offsets[center+1]`)
/// and receives 1 for deletable center edges. Returns 1 if any edge is
/// deletable, 0 if none, or a negative error code.
#[no_mangle]
#[allow(clippy::too_many_arguments)]
pub extern "C" fn stp_sd_star_csr(
    n: u32,
    offsets: *const u32, // len n+1
    targets: *const u32, // len m
    weights: *const f64, // len m
    center: u32,
    edge_limit: u64,
    out_deletable: *mut u8,
    info: *mut StarInfo,
) -> i32 {
    let code = run_star(n, offsets, targets, weights, center, edge_limit, out_deletable, info);
    if code < 0 && !info.is_null() {
        unsafe { *info = StarInfo { error_code: code, ..StarInfo::default() }; }
    }
    code
}

#[allow(clippy::too_many_arguments)]
fn run_star(
    n: u32,
    offsets: *const u32,
    targets: *const u32,
    weights: *const f64,
    center: u32,
    edge_limit: u64,
    out_deletable: *mut u8,
    info: *mut StarInfo,
) -> i32 {
    if n == 0 { return -1; }
    if center >= n { return -2; }
    if offsets.is_null() || targets.is_null() || weights.is_null() || out_deletable.is_null() { return -3; }

    // Safety: caller promises valid lengths. m is read from offsets[n].
    let n_usize = n as usize;
    let off = unsafe { slice::from_raw_parts(offsets, n_usize + 1) };
    let m = off[n_usize] as usize;
    let tgt = unsafe { slice::from_raw_parts(targets, m) };
    let wts = unsafe { slice::from_raw_parts(weights, m) };
    let csr = match Csr::from_parts(off, tgt, wts) {
        Ok(csr) => csr,
        Err(_) => return -4,
    };

    let c = NodeId(center);
    let row_start = off[center as usize] as usize;
    let degree = csr.degree(c);
    let out = unsafe { slice::from_raw_parts_mut(out_deletable, degree) };
    let mut deletable = vec![false; degree];
    let mut scratch = StarScratch::new(n_usize);
    let any = sd_star(&csr, c, edge_limit, &mut scratch, &mut deletable);

    // rows are sorted inside the CSR; map back to the caller's order
    for (e, &del) in csr.range(c).zip(&deletable) {
        out[csr.arcs()[e].index() - row_start] = del as u8;
    }
    if !info.is_null() {
        let count = deletable.iter().filter(|&&d| d).count() as u32;
        unsafe { *info = StarInfo { scanned: scratch.scanned(), deletable: count, error_code: 0 }; }
    }
    any as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn star_over_raw_arrays() {
        // center 0 with row [3, 2, 1] (costs 1, 1, 5); 2-1 costs 1
        let offsets = [0u32, 3, 5, 7, 8];
        let targets = [3u32, 2, 1, 0, 2, 0, 1, 0];
        let weights = [1.0f64, 1.0, 5.0, 5.0, 1.0, 1.0, 1.0, 1.0];
        let mut out = [9u8; 3];
        let mut info = StarInfo::default();
        let rc = stp_sd_star_csr(4, offsets.as_ptr(), targets.as_ptr(), weights.as_ptr(), 0, 100, out.as_mut_ptr(), &mut info);
        assert_eq!(rc, 1);
        assert_eq!(out, [0, 0, 1]);
        assert_eq!(info.deletable, 1);
        assert_eq!(info.error_code, 0);
        assert!(info.scanned > 0);
    }

    #[test]
    fn error_codes() {
        let offsets = [0u32, 1, 2];
        let targets = [1u32, 0];
        let weights = [1.0f64, 1.0];
        let mut out = [0u8; 1];
        let mut info = StarInfo::default();
        let p = (offsets.as_ptr(), targets.as_ptr(), weights.as_ptr());
        assert_eq!(stp_sd_star_csr(0, p.0, p.1, p.2, 0, 10, out.as_mut_ptr(), &mut info), -1);
        assert_eq!(stp_sd_star_csr(2, p.0, p.1, p.2, 5, 10, out.as_mut_ptr(), &mut info), -2);
        assert_eq!(info.error_code, -2);
        assert_eq!(stp_sd_star_csr(2, p.0, core::ptr::null(), p.2, 0, 10, out.as_mut_ptr(), core::ptr::null_mut()), -3);
        let bad_targets = [7u32, 0];
        assert_eq!(stp_sd_star_csr(2, p.0, bad_targets.as_ptr(), p.2, 0, 10, out.as_mut_ptr(), &mut info), -4);
        assert_eq!(stp_sd_star_csr(2, p.0, p.1, p.2, 0, 10, out.as_mut_ptr(), &mut info), 0);
        assert_eq!(stp_paths_version(), 1);
    }
}
