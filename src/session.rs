//! # 会话状态模块
//!
//! 一次编码或解码操作对应一个 `Session`，由编排器持有并以可变引用传给每个步骤。
//! 阶段严格按顺序推进，任何失败都会进入终止状态 `Failed`。

use std::fmt;

/// 编码/解码流水线所处的阶段。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Idle,
    HeaderHandled,
    MagicHandled,
    ExtnLenHandled,
    ExtnHandled,
    SizeHandled,
    DataHandled,
    Done,
    Failed,
}

impl Stage {
    /// 顺序流水线中的下一个阶段。`Done` 与 `Failed` 没有后继。
    fn successor(self) -> Option<Stage> {
        match self {
            Stage::Idle => Some(Stage::HeaderHandled),
            Stage::HeaderHandled => Some(Stage::MagicHandled),
            Stage::MagicHandled => Some(Stage::ExtnLenHandled),
            Stage::ExtnLenHandled => Some(Stage::ExtnHandled),
            Stage::ExtnHandled => Some(Stage::SizeHandled),
            Stage::SizeHandled => Some(Stage::DataHandled),
            Stage::DataHandled => Some(Stage::Done),
            Stage::Done | Stage::Failed => None,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Idle => "idle",
            Stage::HeaderHandled => "header handled",
            Stage::MagicHandled => "magic marker handled",
            Stage::ExtnLenHandled => "extension length handled",
            Stage::ExtnHandled => "extension handled",
            Stage::SizeHandled => "content length handled",
            Stage::DataHandled => "content handled",
            Stage::Done => "done",
            Stage::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// 单次操作的显式会话对象，记录当前阶段、已消耗的载体字节数以及载体总长度 (已知时)。
#[derive(Debug)]
pub struct Session {
    stage: Stage,
    consumed: u64,
    carrier_len: Option<u64>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            stage: Stage::Idle,
            consumed: 0,
            carrier_len: None,
        }
    }

    /// 已知载体总长度的会话，可以在读取之前判断剩余字节是否足够。
    pub fn for_carrier(carrier_len: u64) -> Self {
        Self {
            carrier_len: Some(carrier_len),
            ..Self::new()
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// 已从载体中读取的字节数 (包含头部)。
    pub fn consumed(&self) -> u64 {
        self.consumed
    }

    /// 载体中尚未读取的字节数。载体长度未知时返回 `None`。
    pub fn remaining(&self) -> Option<u64> {
        self.carrier_len
            .map(|len| len.saturating_sub(self.consumed))
    }

    pub(crate) fn set_carrier_len(&mut self, carrier_len: u64) {
        self.carrier_len = Some(carrier_len);
    }

    pub(crate) fn consume(&mut self, bytes: usize) {
        self.consumed += bytes as u64;
    }

    /// 推进到 `stage`。只允许进入当前阶段的直接后继。
    pub(crate) fn advance(&mut self, stage: Stage) {
        debug_assert_eq!(
            self.stage.successor(),
            Some(stage),
            "stage {} cannot follow {}",
            stage,
            self.stage
        );
        log::debug!("stage: {} -> {}", self.stage, stage);
        self.stage = stage;
    }

    pub(crate) fn fail(&mut self) {
        log::debug!("stage: {} -> {}", self.stage, Stage::Failed);
        self.stage = Stage::Failed;
    }

    pub fn is_done(&self) -> bool {
        self.stage == Stage::Done
    }
}
