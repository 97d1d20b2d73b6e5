use std::time::{Duration, Instant};

/// ドラッグ中の自動スクロール間隔
pub const AUTO_SCROLL_INTERVAL: Duration = Duration::from_millis(50);

/// 周期タイマーの抽象
///
/// 期限はホストのイベントループが `poll` で確認する。コールバックを別スレッドから
/// 呼ぶことはなく、発火は常に入力イベントと同じスレッドで処理される。
pub trait Scheduler {
    /// `interval` ごとに発火するよう設定（設定済みならやり直し）
    fn arm(&mut self, interval: Duration, now: Instant);

    /// 解除
    fn cancel(&mut self);

    fn is_armed(&self) -> bool;

    /// 次に発火する時刻
    fn next_deadline(&self) -> Option<Instant>;

    /// `now` までに期限が来ていれば true を返し、次の期限を設定する
    fn poll(&mut self, now: Instant) -> bool;
}

/// `Instant` ベースの周期タイマー
#[derive(Debug, Clone, Default)]
pub struct IntervalTimer {
    interval: Duration,
    deadline: Option<Instant>,
}

impl IntervalTimer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Scheduler for IntervalTimer {
    fn arm(&mut self, interval: Duration, now: Instant) {
        self.interval = interval;
        self.deadline = Some(now + interval);
    }

    fn cancel(&mut self) {
        self.deadline = None;
    }

    fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    fn next_deadline(&self) -> Option<Instant> {
        self.deadline
    }

    fn poll(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                // 遅れた分はまとめて1回として扱う
                self.deadline = Some(now + self.interval);
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interval_timer_fires_and_rearms() {
        let start = Instant::now();
        let mut timer = IntervalTimer::new();
        assert!(!timer.poll(start));

        timer.arm(AUTO_SCROLL_INTERVAL, start);
        assert!(timer.is_armed());
        assert!(!timer.poll(start));
        assert!(timer.poll(start + AUTO_SCROLL_INTERVAL));
        assert_eq!(
            timer.next_deadline(),
            Some(start + AUTO_SCROLL_INTERVAL * 2)
        );

        timer.cancel();
        assert!(!timer.is_armed());
        assert!(!timer.poll(start + AUTO_SCROLL_INTERVAL * 10));
    }
}
