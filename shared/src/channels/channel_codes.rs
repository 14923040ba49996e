//! Optional channel code conventions.

use crate::types::ChannelCode;

pub const UNRELIABLE_UNORDERED: ChannelCode = 0;

pub const RELIABLE_UNORDERED: ChannelCode = 1;

pub const UNRELIABLE_ORDERED_1: ChannelCode = 2;
pub const UNRELIABLE_ORDERED_2: ChannelCode = 3;
pub const UNRELIABLE_ORDERED_3: ChannelCode = 4;
pub const UNRELIABLE_ORDERED_4: ChannelCode = 5;

pub const RELIABLE_ORDERED_1: ChannelCode = 6;
pub const RELIABLE_ORDERED_2: ChannelCode = 7;
pub const RELIABLE_ORDERED_3: ChannelCode = 8;
pub const RELIABLE_ORDERED_4: ChannelCode = 9;
