//! SPDX-FileCopyrightText: © 2025 Cory Parent <goedelsoup+orasi@goedelsoup.io>
//! SPDX-License-Identifier: Apache-2.0
//!

//! Backend instance management
//!
//! [`InstanceManager`] caches connection handles for one settings
//! fingerprint; [`InstanceProvider`] swaps managers when settings change.

pub mod manager;
pub mod provider;

pub use manager::{HandleKey, InstanceManager, InstanceState};
pub use provider::InstanceProvider;
