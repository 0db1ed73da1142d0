use alloy::hex;
use alloy::primitives::{Address, U256};
use alloy::sol_types::{SolCall, SolError};
use std::fmt::Write as _;

use crate::contract::CallResult;
use crate::revert::Revert;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameOutcome {
    Running,
    Returned,
    Reverted(Revert),
}

/// One message call of a transaction, in call order.
#[derive(Debug, Clone)]
pub struct CallFrame {
    pub depth: usize,
    pub caller: Address,
    pub target: Address,
    pub value: U256,
    pub selector: Option<[u8; 4]>,
    pub outcome: FrameOutcome,
}

impl CallFrame {
    pub(crate) fn open(
        depth: usize,
        caller: Address,
        target: Address,
        value: U256,
        data: &[u8],
    ) -> Self {
        Self {
            depth,
            caller,
            target,
            value,
            selector: data.get(..4).and_then(|bytes| bytes.try_into().ok()),
            outcome: FrameOutcome::Running,
        }
    }

    pub(crate) fn close(&mut self, result: &CallResult) {
        self.outcome = match result {
            Ok(_) => FrameOutcome::Returned,
            Err(revert) => FrameOutcome::Reverted(revert.clone()),
        };
    }

    pub fn is_call<C: SolCall>(&self) -> bool {
        self.selector == Some(C::SELECTOR)
    }

    pub fn is_transfer(&self) -> bool {
        self.selector.is_none()
    }

    pub fn revert(&self) -> Option<&Revert> {
        match &self.outcome {
            FrameOutcome::Reverted(revert) => Some(revert),
            _ => None,
        }
    }

    pub fn reverted_with<E: SolError>(&self) -> bool {
        self.revert().is_some_and(|revert| revert.is::<E>())
    }
}

/// Call graph of one transaction, including frames whose effects were
/// rolled back.
#[derive(Debug, Clone, Default)]
pub struct CallTrace {
    frames: Vec<CallFrame>,
}

impl CallTrace {
    pub fn new(frames: Vec<CallFrame>) -> Self {
        Self { frames }
    }

    pub fn frames(&self) -> &[CallFrame] {
        &self.frames
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn max_depth(&self) -> usize {
        self.frames.iter().map(|frame| frame.depth).max().unwrap_or(0)
    }

    pub fn calls_to(&self, target: Address) -> impl Iterator<Item = &CallFrame> {
        self.frames.iter().filter(move |frame| frame.target == target)
    }

    pub fn calls_of<C: SolCall>(&self, target: Address) -> Vec<&CallFrame> {
        self.calls_to(target)
            .filter(|frame| frame.is_call::<C>())
            .collect()
    }

    /// Frames that failed with `E`, deepest first.
    pub fn reverts_with<E: SolError>(&self) -> Vec<&CallFrame> {
        let mut frames: Vec<&CallFrame> = self
            .frames
            .iter()
            .filter(|frame| frame.reverted_with::<E>())
            .collect();
        frames.sort_by(|a, b| b.depth.cmp(&a.depth));
        frames
    }

    /// `(depth, target)` pairs in call order.
    pub fn path(&self) -> Vec<(usize, Address)> {
        self.frames
            .iter()
            .map(|frame| (frame.depth, frame.target))
            .collect()
    }

    pub fn render(&self, name_of: impl Fn(Address) -> String) -> String {
        let mut out = String::new();
        for frame in &self.frames {
            let call = frame
                .selector
                .map(hex::encode_prefixed)
                .unwrap_or_else(|| "receive".to_string());
            let outcome = match &frame.outcome {
                FrameOutcome::Running => "running".to_string(),
                FrameOutcome::Returned => "ok".to_string(),
                FrameOutcome::Reverted(revert) => format!("revert {}", hex::encode_prefixed(revert.data())),
            };
            let _ = writeln!(
                out,
                "{:indent$}{} -> {} [{call}] value={} {outcome}",
                "",
                name_of(frame.caller),
                name_of(frame.target),
                frame.value,
                indent = frame.depth * 2,
            );
        }
        out
    }
}
