//! Integration tests for weather-cache

mod support;

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::path::Path;
    use tempfile::TempDir;

    const BODY: &str = r#"{
        "weather": [{"id": 500, "main": "Rain", "description": "light rain", "icon": "10d"}],
        "main": {"temp": 278.15, "feels_like": 275.0, "temp_min": 277.0, "temp_max": 279.0,
                 "pressure": 1009, "humidity": 88},
        "visibility": 9000,
        "wind": {"speed": 4.1, "deg": 200},
        "clouds": {"all": 90},
        "dt": 1709294400,
        "sys": {"country": "NO"},
        "name": "Oslo",
        "cod": 200
    }"#;

    fn weather_cache(config: &Path) -> Command {
        let mut cmd = cargo_bin_cmd!("weather-cache");
        cmd.env_remove("OPENWEATHERMAP_API_KEY")
            .env_remove("WEATHER_CACHE_CONFIG")
            .arg("--config")
            .arg(config);
        cmd
    }

    /// Answer exactly one HTTP request with `body`
    fn serve_once(body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        std::thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut buf = [0u8; 4096];
            let mut request = Vec::new();
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = stream.read(&mut buf).unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            let response = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                body.len(),
                body
            );
            stream.write_all(response.as_bytes()).unwrap();
        });

        format!("http://{}/data/2.5/weather", addr)
    }

    #[test]
    fn help_displays() {
        cargo_bin_cmd!("weather-cache")
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("OpenWeatherMap"));
    }

    #[test]
    fn version_displays() {
        cargo_bin_cmd!("weather-cache")
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("weather-cache"));
    }

    #[test]
    fn config_path() {
        let temp = TempDir::new().unwrap();
        let config = temp.path().join("config.toml");

        weather_cache(&config)
            .args(["config", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains("config.toml"));
    }

    #[test]
    fn config_show_defaults() {
        let temp = TempDir::new().unwrap();

        weather_cache(&temp.path().join("config.toml"))
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("[cache]"))
            .stdout(predicate::str::contains("cache_period_ms = 60000"));
    }

    #[test]
    fn config_set_then_show() {
        let temp = TempDir::new().unwrap();
        let config = temp.path().join("config.toml");

        weather_cache(&config)
            .args(["config", "set", "cache.mode", "always-use-last-fetched-value"])
            .assert()
            .success();

        weather_cache(&config)
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("always-use-last-fetched-value"));
    }

    #[test]
    fn config_set_unknown_key() {
        let temp = TempDir::new().unwrap();

        weather_cache(&temp.path().join("config.toml"))
            .args(["config", "set", "cache.ttl", "5"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Unknown configuration key"));
    }

    #[test]
    fn get_unsupported_query() {
        let temp = TempDir::new().unwrap();

        weather_cache(&temp.path().join("config.toml"))
            .args(["--api-key", "test-key", "get", "station:42"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Unsupported location query"));
    }

    #[test]
    fn get_without_api_key() {
        let temp = TempDir::new().unwrap();

        weather_cache(&temp.path().join("config.toml"))
            .args(["get", "city:Oslo"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("OPENWEATHERMAP_API_KEY"));
    }

    #[test]
    fn get_fetches_once_then_serves_from_cache() {
        let temp = TempDir::new().unwrap();
        let config = temp.path().join("config.toml");
        let responses = temp.path().join("responses");
        let base_url = serve_once(BODY);
        std::fs::write(
            &config,
            format!(
                "[api]\nbase_url = \"{}\"\n\n[response_log]\nenabled = true\ndir = \"{}\"\n",
                base_url,
                responses.display()
            ),
        )
        .unwrap();

        weather_cache(&config)
            .args([
                "--api-key",
                "test-key",
                "get",
                "city:Oslo,NO",
                "--repeat",
                "2",
                "--format",
                "json",
            ])
            .assert()
            .success()
            .stdout(predicate::str::contains("\"api_request_made\": true"))
            .stdout(predicate::str::contains("\"is_from_cache\": true"))
            .stdout(predicate::str::contains("\"query\": \"city:oslo,no\""));

        assert!(responses.join("oslo-no.json").exists());
    }
}
