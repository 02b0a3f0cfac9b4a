//! Types for use when configuring pinhold modules.

use crate::*;

/// helper transcode function
fn tc<S: serde::Serialize, D: serde::de::DeserializeOwned>(
    s: &S,
) -> PinResult<D> {
    serde_json::from_str(
        &serde_json::to_string(s)
            .map_err(|e| PinError::other_src("encode", e))?,
    )
    .map_err(|e| PinError::other_src("decode", e))
}

/// Denotes a type used to configure a specific pinhold module.
///
/// Note, the types defined in this struct are specifically for
/// configuration that cannot be changed at runtime, the likes of which
/// might be found in a configuration file. Runtime-settable knobs, such
/// as the auto-pin flag, live on the builder instead.
///
/// It is highly recommended that you expose this struct in your module
/// docs to help devs using your module understand how to configure it.
pub trait ModConfig:
    'static
    + Sized
    + Default
    + std::fmt::Debug
    + serde::Serialize
    + serde::de::DeserializeOwned
    + Send
    + Sync
{
}

/// Pinhold configuration.
#[derive(Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct Config(serde_json::Map<String, serde_json::Value>);

impl Config {
    /// When pinhold is generating a default or example configuration
    /// file, it will pass a mutable reference of this config struct to
    /// the module factories that are configured to be used. Those
    /// factories should call this function any number of times to add
    /// any default configuration parameters to that file.
    pub fn add_default_module_config<M: ModConfig>(
        &mut self,
        module_name: String,
    ) -> PinResult<()> {
        if self.0.contains_key(&module_name) {
            return Err(PinError::other(format!(
                "Refusing to overwrite conflicting module name: {module_name}"
            )));
        }
        self.0.insert(module_name, tc(&M::default())?);
        Ok(())
    }

    /// When pinhold is initializing, it will call the factory function
    /// for all of its modules with an immutable reference to this
    /// config struct. Each of those modules may choose to call this
    /// function to extract a module config. Note that this config is
    /// loaded from disk and can be edited by humans, so the
    /// serialization on the module config should be tolerant to missing
    /// properties, setting sane defaults.
    pub fn get_module_config<M: ModConfig>(
        &self,
        module_name: &str,
    ) -> PinResult<M> {
        self.0
            .get(module_name)
            .map(tc)
            .unwrap_or_else(|| Ok(M::default()))
    }
}
