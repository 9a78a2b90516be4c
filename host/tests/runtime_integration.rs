use backdrop::app;
use backdrop::config::{AppConfig, ConfigLoadResult, load_config};
use engine::controller::{BackgroundState, ControllerHandle};
use engine::model::{LoadStatus, Theme};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;

// Media host serving the light video and nothing else
mod media_helpers {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    pub async fn serve_media() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());

        tokio::spawn(async move {
            loop {
                let Ok((mut socket, _)) = listener.accept().await else {
                    return;
                };
                tokio::spawn(async move {
                    let mut buf = Vec::new();
                    let mut chunk = [0u8; 1024];
                    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
                        match socket.read(&mut chunk).await {
                            Ok(0) | Err(_) => return,
                            Ok(n) => buf.extend_from_slice(&chunk[..n]),
                        }
                    }
                    let request = String::from_utf8_lossy(&buf).to_string();
                    let response = if request.contains("/videos/background-light.mp4") {
                        "HTTP/1.1 206 Partial Content\r\nContent-Length: 4\r\nConnection: close\r\n\r\nmp4!"
                    } else {
                        "HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n"
                    };
                    let _ = socket.write_all(response.as_bytes()).await;
                    let _ = socket.shutdown().await;
                });
            }
        });

        base
    }
}

struct Workspace {
    _dir: TempDir,
    config: Box<AppConfig>,
    theme_file: PathBuf,
    preference_dir: PathBuf,
}

fn workspace(media_base: &str, theme: &str) -> Workspace {
    let dir = tempfile::tempdir().unwrap();
    let theme_file = dir.path().join("theme");
    let preference_dir = dir.path().join("prefs");
    std::fs::write(&theme_file, theme).unwrap();

    let config_path = dir.path().join("config.toml");
    std::fs::write(
        &config_path,
        format!(
            r#"
            [resolver]
            direct_base = "{media_base}"
            request_timeout_secs = 5

            [background]
            prewarm = false
            load_timeout_secs = 5
            revert_delay_ms = 100
            notification_visible_ms = 500

            [theme]
            poll_interval_ms = 20

            [preference]
            dir = "{}"
            "#,
            preference_dir.display()
        ),
    )
    .unwrap();

    let config = match load_config(&config_path) {
        ConfigLoadResult::Success(config) => config,
        ConfigLoadResult::LoadError(e) | ConfigLoadResult::DeserializeError(e) => panic!("{e}"),
    };

    Workspace {
        _dir: dir,
        config,
        theme_file,
        preference_dir,
    }
}

async fn wait_for(handle: &ControllerHandle, expected: BackgroundState) {
    for _ in 0..100 {
        if handle.state() == expected {
            return;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    panic!("state never became {expected:?}, still {:?}", handle.state());
}

async fn wait_for_status(handle: &ControllerHandle, theme: Theme, expected: LoadStatus) {
    for _ in 0..100 {
        if handle.snapshot().await.unwrap().status(theme) == expected {
            return;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    panic!("{theme} status never became {expected}");
}

fn stored_preference(dir: &Path) -> String {
    std::fs::read_to_string(dir.join("background_preference.json")).unwrap()
}

#[tokio::test]
async fn test_toggle_plays_reachable_video() {
    let base = media_helpers::serve_media().await;
    let ws = workspace(&base, "light");
    let runtime = app::start(&ws.config, Some(ws.theme_file.clone())).unwrap();

    runtime.handle.toggle().unwrap();
    wait_for(&runtime.handle, BackgroundState::VideoActive(Theme::Light)).await;

    let snapshot = runtime.handle.snapshot().await.unwrap();
    assert_eq!(snapshot.status(Theme::Light), LoadStatus::Loaded);
    assert_eq!(
        snapshot.resource(Theme::Light).unwrap().resolved_url,
        Some(format!("{base}/videos/background-light.mp4"))
    );
    assert_eq!(stored_preference(&ws.preference_dir), r#"{"mode":"video"}"#);

    runtime.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_unreachable_video_reverts_to_image() {
    let base = media_helpers::serve_media().await;
    let ws = workspace(&base, "dark");
    let runtime = app::start(&ws.config, Some(ws.theme_file.clone())).unwrap();

    runtime.handle.toggle().unwrap();
    wait_for_status(&runtime.handle, Theme::Dark, LoadStatus::Error).await;
    wait_for(&runtime.handle, BackgroundState::Image).await;
    assert_eq!(stored_preference(&ws.preference_dir), r#"{"mode":"image"}"#);

    runtime.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_theme_file_change_switches_video() {
    let base = media_helpers::serve_media().await;
    let ws = workspace(&base, "hope-ui hope-ui-light");
    let runtime = app::start(&ws.config, Some(ws.theme_file.clone())).unwrap();

    runtime.handle.toggle().unwrap();
    wait_for(&runtime.handle, BackgroundState::VideoActive(Theme::Light)).await;

    std::fs::write(&ws.theme_file, "hope-ui hope-ui-dark").unwrap();
    wait_for(&runtime.handle, BackgroundState::Image).await;

    let snapshot = runtime.handle.snapshot().await.unwrap();
    assert_eq!(snapshot.status(Theme::Light), LoadStatus::Loaded);
    assert_eq!(snapshot.status(Theme::Dark), LoadStatus::Error);

    runtime.shutdown().await.unwrap();
}
