// SPDX-License-Identifier: MIT

pub mod chat;
pub mod error;
