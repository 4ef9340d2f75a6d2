//! 回调槽
//!
//! [`OneShot`]：单次回调，后注册的覆盖未触发的旧回调，触发后即清空。
//! [`FrameTickListeners`]：持久的帧监听，可同时存在多个，独立增删。

use std::fmt;

/// 单次回调槽
pub struct OneShot<F: ?Sized> {
    handler: Option<Box<F>>,
}

impl<F: ?Sized> OneShot<F> {
    pub fn new() -> Self {
        Self { handler: None }
    }

    /// 注册回调。返回是否覆盖了尚未触发的旧回调
    pub fn register(&mut self, handler: Box<F>) -> bool {
        self.handler.replace(handler).is_some()
    }

    /// 取出回调，槽位随即清空
    ///
    /// 回调需要再次访问拥有者（例如在回调里发起新的跳帧）时，
    /// 先取出再调用。
    pub fn take(&mut self) -> Option<Box<F>> {
        self.handler.take()
    }

    pub fn is_armed(&self) -> bool {
        self.handler.is_some()
    }

    pub fn clear(&mut self) {
        self.handler = None;
    }
}

impl<A> OneShot<dyn FnOnce(A)> {
    /// 调用并清空；没有回调时返回 false
    pub fn consume(&mut self, arg: A) -> bool {
        match self.handler.take() {
            Some(handler) => {
                handler(arg);
                true
            }
            None => false,
        }
    }
}

impl<F: ?Sized> Default for OneShot<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: ?Sized> fmt::Debug for OneShot<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OneShot")
            .field("armed", &self.is_armed())
            .finish()
    }
}

/// 帧监听订阅句柄
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type FrameListener = Box<dyn FnMut(i32)>;

/// 持久帧监听列表
#[derive(Default)]
pub struct FrameTickListeners {
    next_id: u64,
    listeners: Vec<(SubscriptionId, FrameListener)>,
}

impl FrameTickListeners {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: FnMut(i32) + 'static,
    {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// 返回是否确实移除了监听
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(existing, _)| *existing != id);
        self.listeners.len() != before
    }

    pub fn clear(&mut self) {
        self.listeners.clear();
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// 按订阅顺序通知
    pub fn publish(&mut self, frame: i32) {
        for (_, listener) in self.listeners.iter_mut() {
            listener(frame);
        }
    }
}

impl fmt::Debug for FrameTickListeners {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameTickListeners")
            .field("count", &self.listeners.len())
            .finish()
    }
}
