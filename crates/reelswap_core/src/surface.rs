//! 显示面板接口

use crate::SlotId;

/// 接收解码画面的显示面板
///
/// 控制器在切换播放器、关闭视频和更换面板时重新绑定；
/// `None` 表示解除绑定（释放时）。
pub trait DisplaySurface {
    fn bind(&mut self, slot: Option<SlotId>);
}

impl<F> DisplaySurface for F
where
    F: FnMut(Option<SlotId>),
{
    fn bind(&mut self, slot: Option<SlotId>) {
        self(slot)
    }
}
