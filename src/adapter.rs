//! Adapter string parsing and opening
//!
//! An adapter is specified as `"name"` or `"name:key1=value1,key2=value2"`,
//! e.g. `dmem:base=0x4002000,device=/dev/mem,max-aps=2`. Only the dmem
//! adapter exists today.

use std::collections::HashMap;
use std::path::PathBuf;

use m0flash_dmem::bus::MemApBus;
use m0flash_dmem::{DmemConfig, DmemDap};

/// Parsed adapter parameters
pub struct AdapterParams {
    /// Adapter name
    pub name: String,
    /// Key-value parameters
    pub params: HashMap<String, String>,
}

/// Split an adapter string into name and parameters
pub fn parse_adapter_params(s: &str) -> Result<AdapterParams, Box<dyn std::error::Error>> {
    let (name, opts_str) = s.split_once(':').unwrap_or((s, ""));

    let mut params = HashMap::new();
    if !opts_str.is_empty() {
        for opt in opts_str.split(',') {
            if let Some((key, value)) = opt.split_once('=') {
                params.insert(key.to_string(), value.to_string());
            } else {
                return Err(
                    format!("Invalid parameter format: '{}' (expected key=value)", opt).into(),
                );
            }
        }
    }

    Ok(AdapterParams {
        name: name.to_string(),
        params,
    })
}

fn parse_u64(key: &str, s: &str) -> Result<u64, Box<dyn std::error::Error>> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => s.parse(),
    };
    parsed.map_err(|e| format!("invalid value for {key}: '{s}': {e}").into())
}

/// Build a dmem configuration from adapter parameters
pub fn dmem_config(params: &AdapterParams) -> Result<DmemConfig, Box<dyn std::error::Error>> {
    let mut config = DmemConfig::default();
    let mut ap_list: Vec<u64> = Vec::new();

    for (key, value) in &params.params {
        match key.as_str() {
            "device" => config.device = PathBuf::from(value),
            "base" | "base-address" => config.base_address = parse_u64(key, value)?,
            "stride" | "ap-address-offset" => {
                config.ap_stride = parse_u64(key, value)? as u32;
            }
            "max-aps" => config.max_aps = parse_u64(key, value)? as u8,
            "emu-aps" => {
                for item in value.split(';') {
                    ap_list.push(parse_u64(key, item)?);
                }
            }
            "emu-base" => config.emu_base = parse_u64(key, value)?,
            "emu-size" => config.emu_size = parse_u64(key, value)?,
            "ap" | "halted" => {} // handled by open_adapter
            other => return Err(format!("unknown dmem parameter: {other}").into()),
        }
    }
    config.set_emu_ap_list(&ap_list)?;

    Ok(config)
}

/// Open the configured adapter and wrap it into a target bus
///
/// Extra keys consumed here: `ap` selects the MEM-AP index the flash driver
/// talks through (default 0); `halted=no` declares the core running, which
/// makes erase and program refuse to start.
pub fn open_adapter(spec: &str) -> Result<MemApBus, Box<dyn std::error::Error>> {
    let params = parse_adapter_params(spec)?;
    if params.name != "dmem" {
        return Err(format!("Unknown adapter: {}", params.name).into());
    }

    let config = dmem_config(&params)?;
    let ap_index = match params.params.get("ap") {
        Some(v) => parse_u64("ap", v)?,
        None => 0,
    };
    let assume_halted = params.params.get("halted").map(String::as_str) != Some("no");

    let mut dap = DmemDap::new(config);
    dap.init().map_err(|e| {
        format!(
            "Failed to initialize dmem adapter: {e}\n\
             Make sure you have root privileges and the DAP base address is correct."
        )
    })?;
    dap.connect()?;

    log::debug!("dmem adapter up, flash access through AP {ap_index}");
    Ok(MemApBus::new(dap, ap_index, assume_halted))
}
