/// 線形バックオフ付き再試行ポリシー。
///
/// I/Oを行う配送関数から分離した純粋なポリシーとして定義し、
/// ネットワークなしで単体テストできるようにする。
use std::time::Duration;

/// 再試行戦略の設定。
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// 最大試行回数（初回を含む）
    max_attempts: usize,
    /// 1回分のバックオフ幅（ミリ秒）。待機時間は `step × 試行回数`。
    step_ms: u64,
}

impl RetryPolicy {
    #[must_use]
    pub const fn new(max_attempts: usize, step_ms: u64) -> Self {
        Self {
            max_attempts,
            step_ms,
        }
    }

    /// 指定された試行が失敗した後に待機すべき期間を計算する。
    ///
    /// # Arguments
    /// * `attempt` - 失敗した試行の番号（1から開始）
    #[must_use]
    pub fn delay_after_attempt(&self, attempt: usize) -> Duration {
        let factor = u64::try_from(attempt).unwrap_or(u64::MAX);
        Duration::from_millis(self.step_ms.saturating_mul(factor))
    }

    /// この試行の後にもう一度試行できるかどうかを判定する。
    #[must_use]
    pub const fn can_retry(&self, attempt: usize) -> bool {
        attempt < self.max_attempts
    }

    #[must_use]
    pub const fn max_attempts(&self) -> usize {
        self.max_attempts
    }
}
