// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Annotation session: the event reducer and the store that runs it.

mod state;
mod store;

pub use state::{should_reseed, Event, Upload, WidgetKey};
pub use store::SessionStore;
