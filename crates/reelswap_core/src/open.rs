//! 打开与预加载
//!
//! 当前播放器已有内容时加载到后台播放器，首帧就绪后立即切换，
//! 或等后台播放器再完成一次跳帧后切换；否则直接加载到当前播放器。

use log::{debug, info, warn};

use crate::{
    DualPlayer, LocationKind, PlaybackEngine, PlayerError, PlayerEvent, SlotId, SourceLocation,
};

/// 打开流程所处阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OpenPhase {
    #[default]
    Idle,
    /// 正在加载到后台播放器
    LoadingIntoStandby { slot: SlotId },
    /// 正在直接加载到当前播放器
    LoadingIntoCurrent { slot: SlotId },
    /// 首帧已就绪，等待后台播放器跳帧完成后切换
    AwaitingDeferredSeek { slot: SlotId },
}

impl OpenPhase {
    /// 正在等待首帧的槽位
    pub fn loading_slot(self) -> Option<SlotId> {
        match self {
            OpenPhase::LoadingIntoStandby { slot } | OpenPhase::LoadingIntoCurrent { slot } => {
                Some(slot)
            }
            _ => None,
        }
    }
}

impl<E: PlaybackEngine + 'static> DualPlayer<E> {
    /// 打开视频
    ///
    /// `on_ready` 在首帧就绪时以实际加载的槽位调用一次；连续打开时只有最后一次的回调有效。
    /// `defer_swap_until_seek` 为 true 时，首帧就绪后不立即切换，
    /// 等后台播放器的下一次跳帧完成再切换（通常在 `on_ready` 里发起跳帧）。
    ///
    /// 持久化存储和随包资源都打不开时返回错误，不会再有回调。
    ///
    /// 加载到后台播放器时显示面板保持绑定在当前播放器，切换时才重新绑定。
    pub fn open_video<F>(
        &mut self,
        source: &str,
        on_ready: F,
        defer_swap_until_seek: bool,
    ) -> Result<SlotId, PlayerError>
    where
        F: FnOnce(&mut Self, SlotId) + 'static,
    {
        let current = self.current_slot().ok_or(PlayerError::NotInitialized)?;
        let preload = self.loaded[current.index()];
        let target = if preload { current.other() } else { current };

        self.on_frame_ready.clear();
        self.deferred_swap = false;
        self.open_phase = OpenPhase::Idle;
        self.loaded[target.index()] = false;
        self.watchdogs[target.index()].reset();

        if let Err(err) = self.open_with_fallback(target, source) {
            warn!("{}", err);
            self.emit(PlayerEvent::OpenFailed {
                source: source.to_string(),
            });
            return Err(err);
        }

        info!(
            "Opening {} into {} ({})",
            source,
            target,
            if preload { "preload" } else { "direct" }
        );
        self.emit(PlayerEvent::Opened {
            slot: target,
            source: source.to_string(),
        });

        if preload {
            self.deferred_swap = defer_swap_until_seek;
            self.open_phase = OpenPhase::LoadingIntoStandby { slot: target };
            self.on_frame_ready
                .register(Box::new(move |player: &mut Self, slot: SlotId| {
                    if defer_swap_until_seek {
                        player.open_phase = OpenPhase::AwaitingDeferredSeek { slot };
                    } else {
                        player.open_phase = OpenPhase::Idle;
                        player.swap();
                    }
                    on_ready(player, slot);
                }));
        } else {
            self.open_phase = OpenPhase::LoadingIntoCurrent { slot: target };
            self.on_frame_ready
                .register(Box::new(move |player: &mut Self, slot: SlotId| {
                    player.open_phase = OpenPhase::Idle;
                    on_ready(player, slot);
                }));
        }

        Ok(target)
    }

    /// 先试持久化存储，失败再试随包资源
    fn open_with_fallback(&mut self, slot: SlotId, source: &str) -> Result<(), PlayerError> {
        let primary = SourceLocation::new(LocationKind::Persistent, self.config.persistent_path(source));
        let fallback = SourceLocation::new(LocationKind::Bundled, source);
        let engine = self.engine_mut(slot).ok_or(PlayerError::NotInitialized)?;

        let primary_err = match engine.open(&primary) {
            Ok(()) => return Ok(()),
            Err(err) => err,
        };
        debug!("{} unavailable ({}), trying {}", primary, primary_err, fallback);

        engine
            .open(&fallback)
            .map_err(|fallback_err| PlayerError::SourceUnavailable {
                path: source.to_string(),
                primary: primary_err,
                fallback: fallback_err,
            })
    }

    /// 首帧就绪。只接受当前打开请求对应槽位的事件
    pub(crate) fn on_first_frame(&mut self, slot: SlotId) {
        if self.open_phase.loading_slot() != Some(slot) {
            debug!("Ignoring first frame from {} ({:?})", slot, self.open_phase);
            return;
        }

        self.loaded[slot.index()] = true;
        self.emit(PlayerEvent::FrameReady { slot });

        if let Some(handler) = self.on_frame_ready.take() {
            handler(self, slot);
        }
    }

    /// 后台播放器跳帧完成时执行延迟的切换
    pub(crate) fn resolve_deferred_swap(&mut self, slot: SlotId) {
        if !self.deferred_swap {
            return;
        }
        if self.open_phase != (OpenPhase::AwaitingDeferredSeek { slot }) || slot != self.active.other() {
            return;
        }

        self.deferred_swap = false;
        self.open_phase = OpenPhase::Idle;
        self.swap();
    }
}
