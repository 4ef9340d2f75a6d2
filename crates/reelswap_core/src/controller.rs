//! 双缓冲播放控制器
//!
//! 持有两个播放引擎：`current` 负责显示，`standby` 用于预加载下一段视频。
//! 宿主每帧调用一次 [`DualPlayer::tick`]，引擎事件经 [`EventSink`] 送回控制器。

use crossbeam_channel::{bounded, unbounded, Receiver, Sender};
use log::{debug, info, warn};

use crate::{
    DisplaySurface, EngineEvent, EngineEventKind, ErrorCode, EventSink, FrameClock,
    FrameTickListeners, OneShot, OpenPhase, PlaybackEngine, PlayerCommand, PlayerConfig,
    PlayerError, PlayerEvent, Role, SeekWatchdog, SlotId, Stage, StageSpec, SubscriptionId,
};

/// 带槽位参数的单次回调
pub type SlotHandler<E> = dyn FnOnce(&mut DualPlayer<E>, SlotId);
/// 无参数的单次回调
pub type DoneHandler<E> = dyn FnOnce(&mut DualPlayer<E>);

/// 双缓冲播放控制器
pub struct DualPlayer<E> {
    pub(crate) config: PlayerConfig,
    pub(crate) clock: FrameClock,
    pub(crate) engines: Option<[E; 2]>,
    pub(crate) active: SlotId,
    pub(crate) loaded: [bool; 2],
    pub(crate) watchdogs: [SeekWatchdog; 2],
    pub(crate) deferred_swap: bool,
    pub(crate) open_phase: OpenPhase,
    surface: Option<Box<dyn DisplaySurface>>,
    bound: Option<SlotId>,
    pub(crate) on_frame_ready: OneShot<SlotHandler<E>>,
    pub(crate) on_seek_finished: OneShot<SlotHandler<E>>,
    on_play_finished: OneShot<DoneHandler<E>>,
    frame_ticks: FrameTickListeners,
    pub(crate) stage: Option<Stage<E>>,
    pub(crate) stage_generation: u64,
    event_tx: Sender<EngineEvent>,
    event_rx: Receiver<EngineEvent>,
    status_tx: Sender<PlayerEvent>,
    status_rx: Receiver<PlayerEvent>,
}

impl<E: PlaybackEngine + 'static> DualPlayer<E> {
    /// 创建未挂接引擎的控制器；挂接前所有操作均为空操作
    pub fn new(config: PlayerConfig) -> Result<Self, PlayerError> {
        let clock = FrameClock::new(config.frame_rate)?;
        let (event_tx, event_rx) = unbounded();
        let (status_tx, status_rx) = bounded(config.status_capacity.max(1));
        let watchdog = SeekWatchdog::new(config.seek_tolerance_ms, config.watchdog_interval_ticks);

        Ok(Self {
            config,
            clock,
            engines: None,
            active: SlotId::FIRST,
            loaded: [false; 2],
            watchdogs: [watchdog.clone(), watchdog],
            deferred_swap: false,
            open_phase: OpenPhase::Idle,
            surface: None,
            bound: None,
            on_frame_ready: OneShot::new(),
            on_seek_finished: OneShot::new(),
            on_play_finished: OneShot::new(),
            frame_ticks: FrameTickListeners::new(),
            stage: None,
            stage_generation: 0,
            event_tx,
            event_rx,
            status_tx,
            status_rx,
        })
    }

    pub fn with_engines(config: PlayerConfig, first: E, second: E) -> Result<Self, PlayerError> {
        let mut player = Self::new(config)?;
        player.init(first, second);
        Ok(player)
    }

    /// 挂接两个引擎。已有引擎会先被关闭并移除监听
    pub fn init(&mut self, first: E, second: E) {
        if self.engines.is_some() {
            self.close_video(true);
        }

        let mut engines = [first, second];
        for slot in SlotId::ALL {
            engines[slot.index()].attach_events(EventSink::new(slot, self.event_tx.clone()));
        }
        self.engines = Some(engines);
        self.active = SlotId::FIRST;
        self.loaded = [false; 2];
        self.bind_surface(Some(self.active));
        info!("Player initialized at {:.3} fps", self.clock.fps());
    }

    // ========== 查询 ==========

    pub fn is_initialized(&self) -> bool {
        self.engines.is_some()
    }

    pub fn config(&self) -> &PlayerConfig {
        &self.config
    }

    pub fn frame_clock(&self) -> FrameClock {
        self.clock
    }

    pub fn current_slot(&self) -> Option<SlotId> {
        self.engines.as_ref().map(|_| self.active)
    }

    pub fn standby_slot(&self) -> Option<SlotId> {
        self.engines.as_ref().map(|_| self.active.other())
    }

    pub fn slot_for(&self, role: Role) -> Option<SlotId> {
        match role {
            Role::Current => self.current_slot(),
            Role::Standby => self.standby_slot(),
        }
    }

    pub fn engine(&self, slot: SlotId) -> Option<&E> {
        self.engines.as_ref().map(|engines| &engines[slot.index()])
    }

    pub fn current(&self) -> Option<&E> {
        self.engine(self.active)
    }

    pub(crate) fn engine_mut(&mut self, slot: SlotId) -> Option<&mut E> {
        self.engines.as_mut().map(|engines| &mut engines[slot.index()])
    }

    fn current_mut(&mut self) -> Option<&mut E> {
        self.engine_mut(self.active)
    }

    /// 该槽位是否已有可播放内容（收到过首帧事件）
    pub fn is_loaded(&self, slot: SlotId) -> bool {
        self.loaded[slot.index()]
    }

    pub fn is_seeking(&self, slot: SlotId) -> bool {
        self.watchdogs[slot.index()].is_pending()
    }

    pub fn is_swap_deferred(&self) -> bool {
        self.deferred_swap
    }

    pub fn open_phase(&self) -> OpenPhase {
        self.open_phase
    }

    /// 显示面板当前绑定的槽位
    pub fn bound_slot(&self) -> Option<SlotId> {
        self.bound
    }

    /// 状态事件接收端
    pub fn status_events(&self) -> Receiver<PlayerEvent> {
        self.status_rx.clone()
    }

    pub(crate) fn emit(&self, event: PlayerEvent) {
        let _ = self.status_tx.try_send(event);
    }

    // ========== 显示面板 ==========

    /// 更换显示面板并立即绑定到当前播放器
    pub fn set_surface(&mut self, surface: impl DisplaySurface + 'static) {
        self.surface = Some(Box::new(surface));
        let slot = self.current_slot();
        self.bind_surface(slot);
    }

    fn bind_surface(&mut self, slot: Option<SlotId>) {
        self.bound = slot;
        if let Some(surface) = self.surface.as_mut() {
            surface.bind(slot);
        }
    }

    // ========== 切换与关闭 ==========

    /// 关闭当前播放器，把后台播放器提升为当前，并重新绑定显示面板
    ///
    /// 调用前 standby 应已加载好下一段视频。
    pub fn swap(&mut self) {
        let Some(engines) = self.engines.as_mut() else {
            return;
        };

        let outgoing = self.active;
        engines[outgoing.index()].close();
        self.loaded[outgoing.index()] = false;
        self.watchdogs[outgoing.index()].reset();
        self.end_stage_on(outgoing);
        self.active = outgoing.other();
        self.bind_surface(Some(self.active));

        info!("Swapped players: {} -> {}", outgoing, self.active);
        self.emit(PlayerEvent::Swapped {
            current: self.active,
        });
    }

    /// 关闭两个播放器的视频并重置所有临时状态
    ///
    /// `remove_listeners` 为 true 时同时移除引擎事件监听（销毁时使用）。
    pub fn close_video(&mut self, remove_listeners: bool) {
        for watchdog in self.watchdogs.iter_mut() {
            watchdog.reset();
        }
        self.deferred_swap = false;
        self.open_phase = OpenPhase::Idle;
        self.active = SlotId::FIRST;
        self.loaded = [false; 2];
        self.on_frame_ready.clear();
        self.on_seek_finished.clear();
        self.on_play_finished.clear();
        self.stage = None;
        self.stage_generation += 1;

        let Some(engines) = self.engines.as_mut() else {
            return;
        };
        for engine in engines.iter_mut() {
            engine.close();
            if remove_listeners {
                engine.detach_events();
            }
        }
        self.bind_surface(Some(self.active));

        info!("Closed video (remove_listeners={})", remove_listeners);
        self.emit(PlayerEvent::Closed);
    }

    /// 释放全部资源：关闭视频、移除监听、解除显示面板，之后的 tick 为空操作
    ///
    /// 返回已关闭的两个引擎。
    pub fn release(&mut self) -> Option<[E; 2]> {
        if self.engines.is_none() {
            return None;
        }

        self.close_video(true);
        self.frame_ticks.clear();
        self.bind_surface(None);
        self.surface = None;
        while self.event_rx.try_recv().is_ok() {}

        info!("Player released");
        self.emit(PlayerEvent::Released);
        self.engines.take()
    }

    // ========== 播放控制 ==========

    pub fn play(&mut self, looping: bool) {
        if let Some(engine) = self.current_mut() {
            engine.set_looping(looping);
            engine.play();
        }
    }

    pub fn pause(&mut self) {
        if let Some(engine) = self.current_mut() {
            engine.pause();
        }
    }

    /// 回到开头并继续播放
    pub fn rewind(&mut self) {
        if let Some(engine) = self.current_mut() {
            engine.rewind();
            engine.play();
        }
    }

    /// 跳到指定帧；`slot` 为 None 时作用于当前播放器
    ///
    /// 目标时间超出 `[0, duration]` 时忽略。
    pub fn seek_to_frame(&mut self, frame: i32, slot: Option<SlotId>) {
        let Some(slot) = slot.or_else(|| self.current_slot()) else {
            return;
        };
        let target_ms = self.clock.time_of(frame);
        let Some(engine) = self.engine_mut(slot) else {
            return;
        };

        let duration_ms = engine.duration_ms();
        if target_ms < 0.0 || target_ms > duration_ms {
            debug!(
                "Ignoring seek to frame {} ({:.1}ms) outside 0..{:.1}ms on {}",
                frame, target_ms, duration_ms, slot
            );
            return;
        }

        engine.seek(target_ms);
        self.watchdogs[slot.index()].arm(target_ms);
    }

    /// 注册单次跳帧完成回调（覆盖未触发的旧回调）
    pub fn on_seek_finished<F>(&mut self, handler: F)
    where
        F: FnOnce(&mut Self, SlotId) + 'static,
    {
        self.on_seek_finished.register(Box::new(handler));
    }

    /// 注册单次播放结束回调（覆盖未触发的旧回调）
    pub fn on_play_finished<F>(&mut self, handler: F)
    where
        F: FnOnce(&mut Self) + 'static,
    {
        self.on_play_finished.register(Box::new(handler));
    }

    // ========== 帧监听 ==========

    pub fn subscribe_frame_tick<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: FnMut(i32) + 'static,
    {
        self.frame_ticks.subscribe(listener)
    }

    pub fn unsubscribe_frame_tick(&mut self, id: SubscriptionId) -> bool {
        self.frame_ticks.unsubscribe(id)
    }

    pub fn unsubscribe_all_frame_ticks(&mut self) {
        self.frame_ticks.clear();
    }

    // ========== 每帧驱动 ==========

    /// 每帧调用一次：处理引擎事件、发布当前帧、轮询跳帧看门狗
    pub fn tick(&mut self) {
        if self.engines.is_none() {
            return;
        }

        self.pump_events();
        self.publish_frame();
        self.poll_watchdogs();
    }

    /// 处理已到达的引擎事件，返回处理数量
    pub fn pump_events(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(event) = self.event_rx.try_recv() {
            if self.engines.is_none() {
                continue;
            }
            self.handle_event(event);
            handled += 1;
        }
        handled
    }

    /// 同步注入一个引擎事件
    pub fn handle_event(&mut self, event: EngineEvent) {
        if self.engines.is_none() {
            return;
        }
        if event.error != ErrorCode::None {
            warn!("{:?} on {} reported {:?}", event.kind, event.slot, event.error);
        }

        match event.kind {
            EngineEventKind::FirstFrameReady => self.on_first_frame(event.slot),
            EngineEventKind::FinishedSeeking => {
                if self.watchdogs[event.slot.index()].complete() {
                    self.finish_seek(event.slot);
                } else {
                    debug!("Seek on {} already finished", event.slot);
                }
            }
            EngineEventKind::FinishedPlaying => self.finish_play(event.slot),
        }
    }

    fn publish_frame(&mut self) {
        let Some(engine) = self.current() else {
            return;
        };
        if !engine.is_playing() {
            return;
        }

        let frame = self.clock.frame_of(engine.current_time_ms());
        self.watch_stage(frame);
        self.frame_ticks.publish(frame);
    }

    fn poll_watchdogs(&mut self) {
        for slot in SlotId::ALL {
            let Some(engine) = self.engine(slot) else {
                return;
            };
            let now_ms = engine.current_time_ms();
            if self.watchdogs[slot.index()].poll(now_ms) {
                debug!("Watchdog finished seek on {} at {:.1}ms", slot, now_ms);
                self.finish_seek(slot);
            }
        }
    }

    /// 跳帧完成（原生事件或看门狗），此时等待标记已清除
    fn finish_seek(&mut self, slot: SlotId) {
        self.resolve_deferred_swap(slot);
        self.emit(PlayerEvent::SeekFinished { slot });

        if let Some(handler) = self.on_seek_finished.take() {
            handler(self, slot);
        }
    }

    fn finish_play(&mut self, slot: SlotId) {
        self.emit(PlayerEvent::PlayFinished { slot });

        if let Some(handler) = self.on_play_finished.take() {
            handler(self);
        }
    }

    // ========== 命令 ==========

    /// 执行一条命令，结果通过状态事件观察
    pub fn apply(&mut self, command: PlayerCommand) {
        match command {
            PlayerCommand::Open { source, defer_swap } => {
                if let Err(err) = self.open_video(&source, |_, _| {}, defer_swap) {
                    debug!("Open command failed: {}", err);
                }
            }
            PlayerCommand::Seek { frame, role } => {
                if let Some(slot) = self.slot_for(role) {
                    self.seek_to_frame(frame, Some(slot));
                }
            }
            PlayerCommand::Play { looping } => self.play(looping),
            PlayerCommand::Pause => self.pause(),
            PlayerCommand::Rewind => self.rewind(),
            PlayerCommand::Stage {
                start,
                end,
                looping,
                role,
            } => {
                if let Some(slot) = self.slot_for(role) {
                    self.play_stage(StageSpec::new(start, end).looping(looping).on(slot));
                }
            }
            PlayerCommand::Close { remove_listeners } => self.close_video(remove_listeners),
            PlayerCommand::Release => {
                self.release();
            }
        }
    }
}
