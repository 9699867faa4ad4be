//! Asset store access and configuration for Promptfolio.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use walkdir::WalkDir;

use pf_core::{CoreError, CoreResult, PromptSource};

/// Default directory name for configuration and logs.
pub const APP_DIR_NAME: &str = "promptfolio";

/// Suffix that turns an image file stem into its prompt file name.
pub const PROMPT_SUFFIX: &str = "_prompt.txt";

pub const DEFAULT_IMAGE_BASE: &str = "public/images";
pub const DEFAULT_PROMPT_BASE: &str = "public/prompts";
pub const DEFAULT_SWEEP_DELAY: Duration = Duration::from_millis(100);

const CONFIG_FILE_NAME: &str = "config.yaml";
const IMAGE_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "webp"];

/// Asset filenames shipped with the gallery, used when no image directory is readable.
pub const DEFAULT_MANIFEST: [&str; 32] = [
    "generated_image_1750667345592.jpg",
    "generated_image_1750732613157.jpg",
    "generated_image_1750732709390.jpg",
    "generated_image_1750733393245.jpg",
    "generated_image_1750736515591.jpg",
    "generated_image_1750737234606.jpg",
    "generated_image_1750737371873.jpg",
    "generated_image_1750740167351.jpg",
    "generated_image_1750740873291.jpg",
    "generated_image_1750741006500.jpg",
    "generated_image_1750741611352.jpg",
    "imagePrompt_imagen_3_0_generate_002_1750744873728.jpg",
    "imagePrompt_imagen_3_0_generate_002_1750746606557.jpg",
    "imagePrompt_imagen_3_0_generate_002_1750749097416.jpg",
    "imagePrompt_imagen_3_0_generate_002_1750750667745.jpg",
    "imagePrompt_imagen_3_0_generate_002_1750751372531.jpg",
    "imagePrompt_imagen_3_0_generate_002_1750752369615.jpg",
    "imagePrompt_imagen_3_0_generate_002_1750753169034.jpg",
    "imagePrompt_imagen_3_0_generate_002_1750754605355.jpg",
    "midjourney_imagen_3_0_generate_002_1750749093535.jpg",
    "midjourney_imagen_3_0_generate_002_1750750658291.jpg",
    "midjourney_imagen_3_0_generate_002_1750752366193.jpg",
    "midjourney_imagen_3_0_generate_002_1750753164866.jpg",
    "midjourney_imagen_3_0_generate_002_1750754600266.jpg",
    "stableDiffusion_imagen_3_0_generate_002_1750749083084.jpg",
    "stableDiffusion_imagen_3_0_generate_002_1750750650169.jpg",
    "stableDiffusion_imagen_3_0_generate_002_1750752361667.jpg",
    "stableDiffusion_imagen_3_0_generate_002_1750753161074.jpg",
    "yaml_imagen_3_0_generate_002_1750749105532.jpg",
    "yaml_imagen_3_0_generate_002_1750750674231.jpg",
    "yaml_imagen_3_0_generate_002_1750752374593.jpg",
    "yaml_imagen_3_0_generate_002_1750753171964.jpg",
];

const IMAGES_ENV: &str = "PROMPTFOLIO_IMAGES";
const PROMPTS_ENV: &str = "PROMPTFOLIO_PROMPTS";

/// Name of the prompt file that sits next to an image.
pub fn prompt_file_name(filename: &str) -> String {
    let stem = Path::new(filename)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or(filename);
    format!("{stem}{PROMPT_SUFFIX}")
}

/// Join an asset base (directory or URL) and a file name.
pub fn join_asset(base: &str, filename: &str) -> String {
    format!("{}/{filename}", base.trim_end_matches('/'))
}

fn is_remote(base: &str) -> bool {
    base.starts_with("http://") || base.starts_with("https://")
}

/// Prompt files read from a local directory.
#[derive(Debug, Clone)]
pub struct FsPromptSource {
    root: PathBuf,
}

impl FsPromptSource {
    /// Create a source rooted at the prompt directory.
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }
}

#[async_trait]
impl PromptSource for FsPromptSource {
    fn name(&self) -> &'static str {
        "filesystem"
    }

    async fn fetch(&self, prompt_file: &str) -> CoreResult<String> {
        let path = self.root.join(prompt_file);
        tokio::fs::read_to_string(&path)
            .await
            .map_err(|err| CoreError::Asset(format!("{}: {err}", path.display())))
    }
}

/// Prompt files served over HTTP under a base URL.
#[derive(Debug, Clone)]
pub struct HttpPromptSource {
    base_url: String,
    client: reqwest::Client,
}

impl HttpPromptSource {
    /// Create a source for `GET <base_url>/<prompt file>`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl PromptSource for HttpPromptSource {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn fetch(&self, prompt_file: &str) -> CoreResult<String> {
        let url = join_asset(&self.base_url, prompt_file);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|err| CoreError::Asset(format!("{url}: {err}")))?;
        response
            .text()
            .await
            .map_err(|err| CoreError::Asset(format!("{url}: {err}")))
    }
}

/// Pick the prompt source matching the base: a URL or a local directory.
pub fn prompt_source_for(base: &str) -> Arc<dyn PromptSource> {
    if is_remote(base) {
        Arc::new(HttpPromptSource::new(base))
    } else {
        Arc::new(FsPromptSource::new(PathBuf::from(base)))
    }
}

/// List image filenames under a local directory, sorted by name.
pub fn discover_images(dir: &Path) -> CoreResult<Vec<String>> {
    if !dir.is_dir() {
        return Err(CoreError::Asset(format!(
            "{} is not a directory",
            dir.display()
        )));
    }
    let mut names = Vec::new();
    for entry in WalkDir::new(dir)
        .max_depth(1)
        .into_iter()
        .filter_map(Result::ok)
    {
        if !entry.file_type().is_file() {
            continue;
        }
        let is_image = entry
            .path()
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()));
        if !is_image {
            continue;
        }
        if let Some(name) = entry.file_name().to_str() {
            names.push(name.to_string());
        }
    }
    names.sort();
    Ok(names)
}

/// Filenames for the catalog: discovered from a local image directory when one exists,
/// otherwise the built-in manifest.
pub fn load_manifest(image_base: &str) -> Vec<String> {
    if !is_remote(image_base) {
        let dir = Path::new(image_base);
        if dir.is_dir() {
            match discover_images(dir) {
                Ok(names) if !names.is_empty() => return names,
                Ok(_) => tracing::debug!(dir = %dir.display(), "no images found, using built-in manifest"),
                Err(err) => tracing::warn!(error = %err, "image discovery failed"),
            }
        }
    }
    DEFAULT_MANIFEST.iter().map(ToString::to_string).collect()
}

/// Values persisted in the configuration file.
#[derive(Debug, Default, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct GalleryConfig {
    pub image_base: Option<String>,
    pub prompt_base: Option<String>,
    pub sweep_delay_ms: Option<u64>,
}

/// Fully resolved asset locations and pacing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetLocations {
    pub image_base: String,
    pub prompt_base: String,
    pub sweep_delay: Duration,
}

/// Explicit values that win over environment and configuration.
#[derive(Debug, Default, Clone)]
pub struct LocationOverrides {
    pub image_base: Option<String>,
    pub prompt_base: Option<String>,
}

fn config_path() -> CoreResult<PathBuf> {
    if let Some(dir) = dirs::config_dir() {
        return Ok(dir.join(APP_DIR_NAME).join(CONFIG_FILE_NAME));
    }
    Err(CoreError::Config("unable to determine config directory".into()))
}

/// Directory for log output.
pub fn log_dir() -> CoreResult<PathBuf> {
    if let Some(dir) = dirs::cache_dir() {
        return Ok(dir.join(APP_DIR_NAME));
    }
    Err(CoreError::Config("unable to determine cache directory".into()))
}

/// Read a configuration file, or the defaults when it does not exist.
pub fn load_config_from(path: &Path) -> CoreResult<GalleryConfig> {
    if !path.exists() {
        return Ok(GalleryConfig::default());
    }
    let contents = fs::read_to_string(path).map_err(|err| CoreError::Config(err.to_string()))?;
    serde_yaml::from_str(&contents).map_err(|err| CoreError::Config(err.to_string()))
}

/// Write a configuration file, creating its parent directory.
pub fn save_config_to(path: &Path, config: &GalleryConfig) -> CoreResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|err| CoreError::Config(err.to_string()))?;
    }
    let contents =
        serde_yaml::to_string(config).map_err(|err| CoreError::Config(err.to_string()))?;
    fs::write(path, contents).map_err(|err| CoreError::Config(err.to_string()))?;
    Ok(())
}

pub fn load_config() -> CoreResult<GalleryConfig> {
    load_config_from(&config_path()?)
}

/// Write the configuration file and return where it was written.
pub fn save_config(config: &GalleryConfig) -> CoreResult<PathBuf> {
    let path = config_path()?;
    save_config_to(&path, config)?;
    Ok(path)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty())
}

/// Resolve each location from overrides, then environment, then config, then defaults.
pub fn resolve_locations_with(
    overrides: LocationOverrides,
    config: GalleryConfig,
) -> AssetLocations {
    resolve_locations_from(overrides, config, |name| std::env::var(name).ok())
}

fn resolve_locations_from(
    overrides: LocationOverrides,
    config: GalleryConfig,
    env: impl Fn(&str) -> Option<String>,
) -> AssetLocations {
    let image_base = non_empty(overrides.image_base)
        .or_else(|| non_empty(env(IMAGES_ENV)))
        .or_else(|| non_empty(config.image_base))
        .unwrap_or_else(|| DEFAULT_IMAGE_BASE.to_string());
    let prompt_base = non_empty(overrides.prompt_base)
        .or_else(|| non_empty(env(PROMPTS_ENV)))
        .or_else(|| non_empty(config.prompt_base))
        .unwrap_or_else(|| DEFAULT_PROMPT_BASE.to_string());
    let sweep_delay = config
        .sweep_delay_ms
        .map_or(DEFAULT_SWEEP_DELAY, Duration::from_millis);

    AssetLocations {
        image_base,
        prompt_base,
        sweep_delay,
    }
}

pub fn resolve_locations(overrides: LocationOverrides) -> CoreResult<AssetLocations> {
    Ok(resolve_locations_with(overrides, load_config()?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve `/prompts/a_prompt.txt` and answer 404 for anything else.
    async fn serve_prompts() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        tokio::spawn(async move {
            loop {
                let Ok((mut stream, _)) = listener.accept().await else {
                    return;
                };
                tokio::spawn(async move {
                    let mut request = Vec::new();
                    let mut buf = [0u8; 1024];
                    while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                        match stream.read(&mut buf).await {
                            Ok(0) | Err(_) => return,
                            Ok(n) => request.extend_from_slice(&buf[..n]),
                        }
                    }
                    let head = String::from_utf8_lossy(&request);
                    let (status, body) = if head.starts_with("GET /prompts/a_prompt.txt ") {
                        ("200 OK", "a fox --ar 3:2")
                    } else {
                        ("404 Not Found", "missing")
                    };
                    let response = format!(
                        "HTTP/1.1 {status}\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                        body.len()
                    );
                    let _ = stream.write_all(response.as_bytes()).await;
                    let _ = stream.shutdown().await;
                });
            }
        });
        format!("http://{addr}/prompts/")
    }

    fn http_source(base_url: String) -> HttpPromptSource {
        HttpPromptSource {
            base_url,
            client: reqwest::Client::builder()
                .no_proxy()
                .build()
                .expect("client"),
        }
    }

    #[test]
    fn prompt_file_replaces_extension() {
        assert_eq!(
            prompt_file_name("generated_image_1750667345592.jpg"),
            "generated_image_1750667345592_prompt.txt"
        );
        assert_eq!(prompt_file_name("cover"), "cover_prompt.txt");
        assert_eq!(join_asset("/images/", "a.jpg"), "/images/a.jpg");
    }

    #[tokio::test]
    async fn fs_source_reads_prompt_text() {
        let temp = TempDir::new().expect("temp dir");
        fs::write(temp.path().join("a_prompt.txt"), "a cat --ar 16:9").expect("write");
        let source = FsPromptSource::new(temp.path().to_path_buf());

        let text = source.fetch("a_prompt.txt").await.expect("fetch");
        assert_eq!(text, "a cat --ar 16:9");
    }

    #[tokio::test]
    async fn fs_source_reports_missing_file() {
        let temp = TempDir::new().expect("temp dir");
        let source = FsPromptSource::new(temp.path().to_path_buf());

        let result = source.fetch("missing_prompt.txt").await;
        assert!(matches!(result, Err(CoreError::Asset(_))));
    }

    #[tokio::test]
    async fn http_source_gets_prompt_under_base_url() {
        let source = http_source(serve_prompts().await);

        let text = source.fetch("a_prompt.txt").await.expect("fetch");
        assert_eq!(text, "a fox --ar 3:2");
    }

    #[tokio::test]
    async fn http_source_maps_error_status_to_asset_error() {
        let source = http_source(serve_prompts().await);

        let result = source.fetch("missing_prompt.txt").await;
        assert!(matches!(result, Err(CoreError::Asset(ref message)) if message.contains("404")));
    }

    #[test]
    fn remote_bases_select_the_http_source() {
        assert_eq!(prompt_source_for("https://cdn.example/prompts").name(), "http");
        assert_eq!(prompt_source_for("public/prompts").name(), "filesystem");
    }

    #[test]
    fn discovery_keeps_sorted_images_only() {
        let temp = TempDir::new().expect("temp dir");
        for name in ["b_1750000000002.png", "a_1750000000001.JPG", "notes.txt"] {
            fs::write(temp.path().join(name), b"").expect("write");
        }

        let names = discover_images(temp.path()).expect("discover");
        assert_eq!(names, vec!["a_1750000000001.JPG", "b_1750000000002.png"]);
        assert_eq!(load_manifest(&temp.path().to_string_lossy()), names);
    }

    #[test]
    fn missing_image_dir_falls_back_to_manifest() {
        let names = load_manifest("/definitely/not/here");
        assert_eq!(names.len(), DEFAULT_MANIFEST.len());
        assert_eq!(names[0], DEFAULT_MANIFEST[0]);
    }

    #[test]
    fn overrides_win_over_config() {
        let config = GalleryConfig {
            image_base: Some("/srv/images".into()),
            prompt_base: Some("https://cdn.example/prompts".into()),
            sweep_delay_ms: Some(0),
        };
        let overrides = LocationOverrides {
            image_base: Some("/tmp/images".into()),
            prompt_base: Some("/tmp/prompts".into()),
        };

        let locations = resolve_locations_with(overrides, config);
        assert_eq!(locations.image_base, "/tmp/images");
        assert_eq!(locations.prompt_base, "/tmp/prompts");
        assert_eq!(locations.sweep_delay, Duration::ZERO);
    }

    #[test]
    fn environment_sits_between_overrides_and_config() {
        let config = GalleryConfig {
            image_base: Some("/srv/images".into()),
            prompt_base: Some("/srv/prompts".into()),
            sweep_delay_ms: None,
        };
        let env = |name: &str| match name {
            "PROMPTFOLIO_IMAGES" => Some("/env/images".to_string()),
            "PROMPTFOLIO_PROMPTS" => Some("  ".to_string()),
            _ => None,
        };

        let locations = resolve_locations_from(LocationOverrides::default(), config.clone(), env);
        assert_eq!(locations.image_base, "/env/images");
        assert_eq!(locations.prompt_base, "/srv/prompts");
        assert_eq!(locations.sweep_delay, DEFAULT_SWEEP_DELAY);

        let overrides = LocationOverrides {
            image_base: Some("/flag/images".into()),
            prompt_base: None,
        };
        let locations = resolve_locations_from(overrides, config, env);
        assert_eq!(locations.image_base, "/flag/images");

        let locations = resolve_locations_from(LocationOverrides::default(), GalleryConfig::default(), |_| None);
        assert_eq!(locations.image_base, DEFAULT_IMAGE_BASE);
        assert_eq!(locations.prompt_base, DEFAULT_PROMPT_BASE);
    }

    #[test]
    fn config_round_trips_through_yaml() {
        let temp = TempDir::new().expect("temp dir");
        let path = temp.path().join("nested").join(CONFIG_FILE_NAME);
        let config = GalleryConfig {
            image_base: Some("/srv/images".into()),
            prompt_base: None,
            sweep_delay_ms: Some(250),
        };

        save_config_to(&path, &config).expect("save");
        assert_eq!(load_config_from(&path).expect("load"), config);
        assert_eq!(
            load_config_from(&temp.path().join("absent.yaml")).expect("load"),
            GalleryConfig::default()
        );
    }
}
