use bevy::prelude::Resource;
use crossbeam_channel::Receiver;
use tracegraph_core::Feed;

#[derive(Resource)]
pub struct FeedRx(pub Receiver<Feed>);
