use std::time::Instant;

use crossterm::event::{KeyEvent, MouseEvent};
use ratatui::layout::Rect;

use crate::ui::RenderSink;

/// ホストから操作されるコントロール
pub trait Control {
    /// 表示領域（画面座標）
    fn area(&self) -> Rect;

    /// 表示領域を設定（作成時とリサイズ時）
    fn set_area(&mut self, area: Rect);

    /// 次の `paint` で全体を描き直させる
    fn invalidate(&mut self);

    /// キー入力。表示が変わりうるなら true
    fn handle_key(&mut self, key: KeyEvent) -> bool;

    /// マウス入力（画面座標）。表示が変わりうるなら true
    fn handle_mouse(&mut self, mouse: MouseEvent) -> bool;

    /// 次にタイマーを発火させたい時刻
    fn next_timer_deadline(&self) -> Option<Instant> {
        None
    }

    /// タイマー発火。表示が変わりうるなら true
    fn on_timer_tick(&mut self, _now: Instant) -> bool {
        false
    }

    /// 変更のあった部分を描画する（座標は表示領域からの相対位置）
    fn paint(&mut self, sink: &mut dyn RenderSink);
}
