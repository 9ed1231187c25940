// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Data model: shapes, selection notes, tools and the project.

pub mod annotation;
pub mod project;
pub mod shape;
pub mod tool;
