// SPDX-License-Identifier: MIT

pub mod kit;
pub mod weft;
