// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Binary image inspection: PE/CLI headers and platform classification.

pub mod pe;
pub mod platform;

pub use pe::{load_image_info, read_image_info, ImageError, ImageInfo, Machine};
pub use platform::TargetPlatform;
