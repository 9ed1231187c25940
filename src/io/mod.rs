// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! I/O operations: image decoding and compositing, snapshot files and export
//! artifacts.

pub mod export;
pub mod media;
pub mod serialization;
