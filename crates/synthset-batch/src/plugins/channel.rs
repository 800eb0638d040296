use crate::{
    config::ConfigError,
    host::{OutputChannel, RenderHost},
    plugin::{parse_options, BatchPlugin, NoOptions, ViewContext},
    BatchError,
};

/// Binds one auxiliary output of the host to `<idx>_<channel>_` before each render.
#[derive(Debug)]
pub struct ChannelPlugin {
    channel: OutputChannel,
}

impl ChannelPlugin {
    /// A plugin for `channel`.
    pub fn new(channel: OutputChannel) -> Self {
        Self { channel }
    }

    fn create(
        channel: OutputChannel,
        options: &serde_json::Value,
    ) -> Result<Box<dyn BatchPlugin>, ConfigError> {
        parse_options::<NoOptions>(channel.as_str(), options)?;
        Ok(Box::new(Self::new(channel)))
    }
}

/// Build the `mask` plugin.
pub fn create_mask(options: &serde_json::Value) -> Result<Box<dyn BatchPlugin>, ConfigError> {
    ChannelPlugin::create(OutputChannel::Mask, options)
}

/// Build the `masked` plugin.
pub fn create_masked(options: &serde_json::Value) -> Result<Box<dyn BatchPlugin>, ConfigError> {
    ChannelPlugin::create(OutputChannel::Masked, options)
}

/// Build the `depth` plugin.
pub fn create_depth(options: &serde_json::Value) -> Result<Box<dyn BatchPlugin>, ConfigError> {
    ChannelPlugin::create(OutputChannel::Depth, options)
}

/// Build the `normal` plugin.
pub fn create_normal(options: &serde_json::Value) -> Result<Box<dyn BatchPlugin>, ConfigError> {
    ChannelPlugin::create(OutputChannel::Normal, options)
}

impl BatchPlugin for ChannelPlugin {
    fn name(&self) -> &'static str {
        self.channel.as_str()
    }

    fn on_camera_created(
        &mut self,
        ctx: &ViewContext<'_>,
        host: &mut dyn RenderHost,
    ) -> Result<(), BatchError> {
        host.bind_output(self.channel, ctx.output_dir, &self.channel.prefix(ctx.index))?;
        Ok(())
    }
}
