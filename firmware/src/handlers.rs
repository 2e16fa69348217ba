// 按压事件处理
use button_press::{ButtonPress, PressKind, Result};
use defmt::info;

/// 处理按钮按下事件
pub fn on_button_press(press: &ButtonPress) -> Result<()> {
    let input = &press.input;

    match press.press.kind {
        PressKind::Released => info!(
            "Handler: Button {} (line {}) pressed for {} ms",
            input.name, input.line, press.press.duration_ms
        ),
        PressKind::HeldMax => info!(
            "Handler: Button {} (line {}) held for {} ms",
            input.name, input.line, press.press.duration_ms
        ),
    }

    Ok(())
}
