use serde::Deserialize;
use std::env;
use std::fs;
use std::path::Path;

/// Header alignment the crate hard-codes in `src/header.rs`.
const HEADER_ALIGN: usize = 16;

#[derive(Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct HeapSection {
    fallback_heap_size: Option<usize>,
    header_canary: Option<u32>,
}

#[derive(Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct Config {
    #[serde(default)]
    heap: HeapSection,
}

struct ResolvedConfig {
    fallback_heap_size: usize,
    header_canary: u32,
}

fn resolve_config(cfg: &HeapSection) -> ResolvedConfig {
    let fallback_heap_size = cfg.fallback_heap_size.unwrap_or(8 * 1024 * 1024);
    let header_canary = cfg.header_canary.unwrap_or(0x6272_6B61);

    assert!(fallback_heap_size > 0, "fallback_heap_size must be > 0");
    assert!(
        fallback_heap_size % HEADER_ALIGN == 0,
        "fallback_heap_size ({}) must be a multiple of {}",
        fallback_heap_size,
        HEADER_ALIGN
    );
    assert!(
        fallback_heap_size <= isize::MAX as usize,
        "fallback_heap_size ({}) must fit in isize",
        fallback_heap_size
    );
    assert!(header_canary != 0, "header_canary must be non-zero");

    ResolvedConfig {
        fallback_heap_size,
        header_canary,
    }
}

fn default_config_path() -> String {
    let manifest_dir = env::var("CARGO_MANIFEST_DIR").unwrap();
    format!("{}/brkalloc.toml", manifest_dir)
}

fn generate_config(cfg: &ResolvedConfig, out_path: &Path) {
    let code = format!(
        "// Auto-generated by build.rs. Do not edit.\n\n\
         pub const FALLBACK_HEAP_SIZE: usize = {};\n\
         pub const HEADER_CANARY: u32 = {:#010x};\n",
        cfg.fallback_heap_size, cfg.header_canary,
    );
    fs::write(out_path, code).expect("failed to write config_gen.rs");
}

fn main() {
    println!("cargo:rerun-if-env-changed=BRKALLOC_CONFIG");

    let out_dir = env::var("OUT_DIR").unwrap();

    let config_path = env::var("BRKALLOC_CONFIG").unwrap_or_else(|_| default_config_path());
    println!("cargo:rerun-if-changed={}", config_path);
    let content = fs::read_to_string(&config_path)
        .unwrap_or_else(|e| panic!("failed to read {}: {}", config_path, e));

    let config: Config = toml::from_str(&content).expect("failed to parse TOML config");
    let resolved = resolve_config(&config.heap);

    generate_config(&resolved, &Path::new(&out_dir).join("config_gen.rs"));
}
