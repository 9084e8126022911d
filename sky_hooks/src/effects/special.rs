use crate::journal::Category;

use super::{EffectContext, SpecialProcessCall};

pub const CHANGE_BORDER_COLOR: u32 = 100;

/// Special process 100: `arg1` selects the global window border color.
pub fn change_border_color(cx: &mut EffectContext<'_>, call: SpecialProcessCall) -> i32 {
    let color_type = i32::from(call.arg1);
    cx.host.change_global_border_color(color_type);
    cx.journal.info(
        Category::SpecialProcess,
        format!("Changed global border color to {color_type}"),
    );
    0
}
