//! # Channel Registry
//!
//! Reference counts per channel plus whether the current connection has been
//! told about each channel. The registry never performs I/O; it returns the
//! transport messages the caller must send.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use shared_types::Channel;

use super::errors::SubscriptionError;

/// Opaque token for one consumer's interest in one channel.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SubscriptionHandle {
    id: u64,
    channel: Channel,
}

impl SubscriptionHandle {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn channel(&self) -> &Channel {
        &self.channel
    }
}

impl fmt::Display for SubscriptionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.channel, self.id)
    }
}

/// Transport message the caller must send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryAction {
    SendSubscribe(Channel),
    SendUnsubscribe(Channel),
}

#[derive(Debug, Default)]
struct ChannelEntry {
    ref_count: usize,
    /// The current connection has been sent a `subscribe` for this channel.
    announced: bool,
}

/// Ref-counted channel set.
#[derive(Debug)]
pub struct ChannelRegistry {
    channels: BTreeMap<Channel, ChannelEntry>,
    handles: HashMap<u64, Channel>,
    next_handle: u64,
    connected: bool,
    max_channels: usize,
}

impl ChannelRegistry {
    pub fn new(max_channels: usize) -> Self {
        Self {
            channels: BTreeMap::new(),
            handles: HashMap::new(),
            next_handle: 1,
            connected: false,
            max_channels,
        }
    }

    /// Register interest in `channel`.
    ///
    /// Returns a `SendSubscribe` action only on the 0 -> 1 transition while
    /// connected. Offline subscriptions are replayed by `on_connected`.
    pub fn subscribe(
        &mut self,
        channel: Channel,
    ) -> Result<(SubscriptionHandle, Option<RegistryAction>), SubscriptionError> {
        if channel.as_str().is_empty() || channel.as_str().contains('*') {
            return Err(SubscriptionError::InvalidChannel(channel));
        }
        if !self.channels.contains_key(&channel) && self.channels.len() >= self.max_channels {
            return Err(SubscriptionError::TooManyChannels {
                limit: self.max_channels,
            });
        }

        let id = self.next_handle;
        self.next_handle += 1;
        self.handles.insert(id, channel.clone());

        let connected = self.connected;
        let entry = self.channels.entry(channel.clone()).or_default();
        entry.ref_count += 1;

        let action = if entry.ref_count == 1 && connected {
            entry.announced = true;
            Some(RegistryAction::SendSubscribe(channel.clone()))
        } else {
            None
        };

        Ok((SubscriptionHandle { id, channel }, action))
    }

    /// Release one handle.
    ///
    /// Returns a `SendUnsubscribe` action only on the 1 -> 0 transition and
    /// only if the server was told about the channel on this connection.
    pub fn unsubscribe(
        &mut self,
        handle: &SubscriptionHandle,
    ) -> Result<Option<RegistryAction>, SubscriptionError> {
        let channel = self
            .handles
            .remove(&handle.id)
            .ok_or(SubscriptionError::UnknownHandle(handle.id))?;

        let Some(entry) = self.channels.get_mut(&channel) else {
            return Ok(None);
        };
        entry.ref_count = entry.ref_count.saturating_sub(1);
        if entry.ref_count > 0 {
            return Ok(None);
        }

        let announced = entry.announced;
        self.channels.remove(&channel);
        Ok(announced.then_some(RegistryAction::SendUnsubscribe(channel)))
    }

    /// The connection reached `Connected`: announce every active channel.
    pub fn on_connected(&mut self) -> Vec<RegistryAction> {
        self.connected = true;
        self.channels
            .iter_mut()
            .map(|(channel, entry)| {
                entry.announced = true;
                RegistryAction::SendSubscribe(channel.clone())
            })
            .collect()
    }

    /// The connection left `Connected`: the server forgets our channels.
    pub fn on_disconnected(&mut self) {
        self.connected = false;
        for entry in self.channels.values_mut() {
            entry.announced = false;
        }
    }

    /// A `subscribe` for `channel` could not be sent; replay it on the next
    /// connect.
    pub fn mark_unannounced(&mut self, channel: &Channel) {
        if let Some(entry) = self.channels.get_mut(channel) {
            entry.announced = false;
        }
    }

    /// Whether any consumer currently holds a handle for `channel`.
    pub fn is_active(&self, channel: &Channel) -> bool {
        self.channels.contains_key(channel)
    }

    pub fn ref_count(&self, channel: &Channel) -> usize {
        self.channels.get(channel).map_or(0, |e| e.ref_count)
    }

    /// Active channels in name order.
    pub fn active_channels(&self) -> Vec<Channel> {
        self.channels.keys().cloned().collect()
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }
}

impl Default for ChannelRegistry {
    fn default() -> Self {
        Self::new(usize::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn connected_registry() -> ChannelRegistry {
        let mut registry = ChannelRegistry::default();
        registry.on_connected();
        registry
    }

    #[test]
    fn test_n_subscribes_send_once() {
        let mut registry = connected_registry();
        let channel = Channel::repair(42);

        let mut actions = Vec::new();
        let mut handles = Vec::new();
        for _ in 0..3 {
            let (handle, action) = registry.subscribe(channel.clone()).unwrap();
            handles.push(handle);
            actions.extend(action);
        }
        for handle in &handles {
            actions.extend(registry.unsubscribe(handle).unwrap());
        }

        assert_eq!(
            actions,
            vec![
                RegistryAction::SendSubscribe(channel.clone()),
                RegistryAction::SendUnsubscribe(channel),
            ]
        );
    }

    #[test]
    fn test_handles_are_distinct() {
        let mut registry = connected_registry();
        let (a, _) = registry.subscribe(Channel::repair(1)).unwrap();
        let (b, _) = registry.subscribe(Channel::repair(1)).unwrap();
        assert_ne!(a, b);
        assert_eq!(registry.ref_count(&Channel::repair(1)), 2);
    }

    #[test]
    fn test_double_unsubscribe_rejected() {
        let mut registry = connected_registry();
        let (handle, _) = registry.subscribe(Channel::repair(1)).unwrap();
        registry.unsubscribe(&handle).unwrap();
        assert_eq!(
            registry.unsubscribe(&handle),
            Err(SubscriptionError::UnknownHandle(handle.id()))
        );
    }

    #[test]
    fn test_offline_subscribe_replays_on_connect() {
        let mut registry = ChannelRegistry::default();
        let (_a, action) = registry.subscribe(Channel::repair(1)).unwrap();
        let (_b, _) = registry.subscribe(Channel::photos(1)).unwrap();
        assert!(action.is_none());

        let replay = registry.on_connected();
        assert_eq!(
            replay,
            vec![
                RegistryAction::SendSubscribe(Channel::photos(1)),
                RegistryAction::SendSubscribe(Channel::repair(1)),
            ]
        );
    }

    #[test]
    fn test_offline_unsubscribe_drops_intent() {
        let mut registry = ChannelRegistry::default();
        let (handle, _) = registry.subscribe(Channel::repair(1)).unwrap();
        assert_eq!(registry.unsubscribe(&handle).unwrap(), None);
        assert!(registry.on_connected().is_empty());
    }

    #[test]
    fn test_reconnect_replays_active_channels() {
        let mut registry = connected_registry();
        let (_handle, _) = registry.subscribe(Channel::repair(7)).unwrap();

        registry.on_disconnected();
        assert!(registry.is_active(&Channel::repair(7)));

        let replay = registry.on_connected();
        assert_eq!(replay, vec![RegistryAction::SendSubscribe(Channel::repair(7))]);
    }

    #[test]
    fn test_unsubscribe_while_offline_sends_nothing() {
        let mut registry = connected_registry();
        let (handle, _) = registry.subscribe(Channel::repair(7)).unwrap();
        registry.on_disconnected();
        assert_eq!(registry.unsubscribe(&handle).unwrap(), None);
    }

    #[test]
    fn test_rejects_patterns_and_empty_names() {
        let mut registry = ChannelRegistry::default();
        assert!(registry.subscribe(Channel::new("repair:*")).is_err());
        assert!(registry.subscribe(Channel::new("")).is_err());
    }

    #[test]
    fn test_channel_limit() {
        let mut registry = ChannelRegistry::new(1);
        registry.subscribe(Channel::repair(1)).unwrap();
        registry.subscribe(Channel::repair(1)).unwrap();
        assert_eq!(
            registry.subscribe(Channel::repair(2)).unwrap_err(),
            SubscriptionError::TooManyChannels { limit: 1 }
        );
    }
}
