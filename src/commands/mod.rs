// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

pub mod config;
pub mod items;
pub mod providers;
pub mod entries;
pub mod pos;
pub mod closing;
pub mod reports;
pub mod importer;
pub mod exporter;
pub mod doctor;
pub mod rules;
