// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

/// What an emitter does with items pushed while downstream has no demand left.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum OverflowStrategy {
    /// Keep every item in an unbounded buffer until demand arrives.
    #[default]
    Buffer,
    /// Discard the item.
    Drop,
    /// Keep only the most recent undelivered item, replacing the previous one.
    Latest,
    /// Fail the stream with [`FlowError::Overflow`](backflow_core::FlowError::Overflow).
    Fail,
}
