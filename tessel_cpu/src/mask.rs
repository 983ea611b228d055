// Copyright 2025 the Tessel Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use crate::blitter::MaskBlitter;
use crate::scan::ScanConverter;
use tessel_common::flatten::FlattenParams;
use tessel_common::geometry::IntRect;
use tessel_common::path::Path;
use tessel_common::pixmap::AlphaMask;

/// Rasterise a device space path into a coverage mask over `bounds`.
///
/// Inverse fills cover everything in `bounds` outside the path.
pub fn rasterize_mask(
    path: &Path,
    bounds: IntRect,
    anti_alias: bool,
    params: FlattenParams,
) -> AlphaMask {
    let mut blitter = MaskBlitter::new(bounds);
    let mut scan = ScanConverter::new(params);
    if anti_alias {
        scan.anti_fill_path(path, &bounds, &mut blitter);
    } else {
        scan.fill_path(path, &bounds, &mut blitter);
    }
    blitter.into_mask()
}
