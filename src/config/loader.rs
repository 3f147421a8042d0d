//! 配置加载器实现
//!
//! 提供TOML配置文件解析、环境变量替换和错误处理功能

use crate::config::types::{validate_config, Config};
use crate::error::{ConfigError, Result};
use async_trait::async_trait;
use regex::Regex;
use std::path::{Path, PathBuf};

/// 配置加载器trait，定义配置加载接口
#[async_trait]
pub trait ConfigLoader: Send + Sync {
    /// 从文件加载配置
    ///
    /// # 参数
    /// * `path` - 配置文件路径
    ///
    /// # 返回
    /// * `Result<Config>` - 加载的配置或错误
    async fn load_from_file<P: AsRef<Path> + Send>(&self, path: P) -> Result<Config>;

    /// 从字符串加载配置
    async fn load_from_string(&self, content: &str) -> Result<Config>;

    /// 验证配置
    fn validate(&self, config: &Config) -> Result<()>;
}

/// TOML配置加载器实现
#[derive(Debug, Clone)]
pub struct TomlConfigLoader {
    /// 是否启用环境变量替换
    enable_env_substitution: bool,
}

impl TomlConfigLoader {
    /// 创建新的TOML配置加载器
    ///
    /// # 参数
    /// * `enable_env_substitution` - 是否启用环境变量替换
    pub fn new(enable_env_substitution: bool) -> Self {
        Self {
            enable_env_substitution,
        }
    }

    /// 替换字符串中的 `${VAR_NAME}` 环境变量
    fn substitute_env_vars(&self, content: &str) -> Result<String> {
        if !self.enable_env_substitution {
            return Ok(content.to_string());
        }

        let env_var_regex = Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}")
            .map_err(|e| ConfigError::ParseError(format!("正则表达式错误: {}", e)))?;

        let mut result = content.to_string();

        for captures in env_var_regex.captures_iter(content) {
            let full_match = &captures[0];
            let var_name = &captures[1];

            match std::env::var(var_name) {
                Ok(value) => {
                    result = result.replace(full_match, &value);
                }
                Err(_) => {
                    return Err(ConfigError::EnvVarError {
                        var: var_name.to_string(),
                    }
                    .into());
                }
            }
        }

        Ok(result)
    }

    fn parse_toml(&self, content: &str) -> Result<Config> {
        let processed_content = self.substitute_env_vars(content)?;

        let config: Config = toml::from_str(&processed_content)
            .map_err(|e| ConfigError::ParseError(format!("TOML解析失败: {}", e)))?;

        Ok(config)
    }
}

impl Default for TomlConfigLoader {
    fn default() -> Self {
        Self::new(true)
    }
}

#[async_trait]
impl ConfigLoader for TomlConfigLoader {
    async fn load_from_file<P: AsRef<Path> + Send>(&self, path: P) -> Result<Config> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::FileNotFound {
                path: path.to_string_lossy().to_string(),
            }
            .into());
        }

        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| ConfigError::ParseError(format!("读取文件失败: {}", e)))?;

        let config = self.parse_toml(&content)?;
        self.validate(&config)?;

        log::info!("成功加载配置文件: {}", path.display());
        log::debug!("配置内容: {:?}", config);

        Ok(config)
    }

    async fn load_from_string(&self, content: &str) -> Result<Config> {
        let config = self.parse_toml(content)?;
        self.validate(&config)?;

        log::debug!("成功解析配置字符串");

        Ok(config)
    }

    fn validate(&self, config: &Config) -> Result<()> {
        validate_config(config).map_err(|e| ConfigError::ValidationError(e).into())
    }
}

/// 获取默认配置文件路径
///
/// 优先使用当前目录下的 `config.toml`，否则使用
/// `<config_dir>/uptime-vitals/config.toml`。
pub fn get_default_config_path() -> PathBuf {
    let local = PathBuf::from("config.toml");
    if local.exists() {
        return local;
    }

    dirs::config_dir()
        .map(|config_dir| config_dir.join(crate::APP_NAME).join("config.toml"))
        .unwrap_or(local)
}

/// 解析最终使用的配置
///
/// 显式指定的路径必须存在；未指定时默认路径缺失则回退到内置默认配置。
pub async fn resolve_config(explicit_path: Option<&Path>) -> Result<Config> {
    let loader = TomlConfigLoader::default();

    match explicit_path {
        Some(path) => loader.load_from_file(path).await,
        None => {
            let path = get_default_config_path();
            if path.exists() {
                loader.load_from_file(&path).await
            } else {
                log::info!("未找到配置文件 {}，使用默认配置", path.display());
                Ok(Config::default())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;
    use std::io::Write;

    const TEST_CONFIG_TOML: &str = r#"
[global]
check_interval_seconds = 15
request_timeout_seconds = 5
log_level = "debug"

[global.web]
port = 9090

[[endpoints]]
name = "api"
url = "https://example.com/health"

[[endpoints]]
name = "docs"
url = "https://docs.example.com"
"#;

    const TEST_CONFIG_WITH_ENV_VARS: &str = r#"
[[endpoints]]
name = "internal"
url = "https://${UPTIME_VITALS_TEST_HOST}/health"
"#;

    #[tokio::test]
    async fn test_toml_parsing() {
        let loader = TomlConfigLoader::new(false);
        let config = loader.load_from_string(TEST_CONFIG_TOML).await.unwrap();

        assert_eq!(config.global.check_interval_seconds, 15);
        assert_eq!(config.global.request_timeout_seconds, 5);
        assert_eq!(config.global.log_level, "debug");
        assert_eq!(config.global.web.port, 9090);
        assert_eq!(config.global.web.bind_address, "0.0.0.0");
        // 未指定的字段使用默认值
        assert_eq!(config.global.history_window_hours, 10);
        assert_eq!(config.endpoints.len(), 2);
        assert_eq!(config.endpoints[1].name, "docs");
    }

    #[tokio::test]
    #[serial]
    async fn test_env_var_substitution() {
        env::set_var("UPTIME_VITALS_TEST_HOST", "internal.example.com");

        let loader = TomlConfigLoader::new(true);
        let config = loader
            .load_from_string(TEST_CONFIG_WITH_ENV_VARS)
            .await
            .unwrap();

        assert_eq!(
            config.endpoints[0].url,
            "https://internal.example.com/health"
        );

        env::remove_var("UPTIME_VITALS_TEST_HOST");
    }

    #[tokio::test]
    #[serial]
    async fn test_env_var_substitution_missing_var() {
        env::remove_var("UPTIME_VITALS_TEST_HOST");

        let loader = TomlConfigLoader::new(true);
        let result = loader.load_from_string(TEST_CONFIG_WITH_ENV_VARS).await;

        let err = result.unwrap_err();
        assert!(err.to_string().contains("UPTIME_VITALS_TEST_HOST"));
    }

    #[tokio::test]
    async fn test_validation_error_is_reported() {
        let loader = TomlConfigLoader::new(false);
        let result = loader
            .load_from_string("[global]\ncheck_interval_seconds = 0\n")
            .await;

        assert!(result.unwrap_err().to_string().contains("检测间隔不能为0"));
    }

    #[tokio::test]
    async fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(TEST_CONFIG_TOML.as_bytes()).unwrap();

        let loader = TomlConfigLoader::new(false);
        let config = loader.load_from_file(file.path()).await.unwrap();
        assert_eq!(config.endpoints[0].name, "api");
    }

    #[tokio::test]
    async fn test_load_missing_file() {
        let loader = TomlConfigLoader::new(false);
        let result = loader
            .load_from_file("/definitely/not/here/config.toml")
            .await;

        assert!(matches!(
            result,
            Err(crate::error::UptimeVitalsError::Config(
                ConfigError::FileNotFound { .. }
            ))
        ));
    }

    #[tokio::test]
    async fn test_resolve_explicit_missing_path_fails() {
        let result = resolve_config(Some(Path::new("/definitely/not/here.toml"))).await;
        assert!(result.is_err());
    }

    #[test]
    fn test_substitute_env_vars_disabled() {
        let loader = TomlConfigLoader::new(false);
        let content = "test ${VAR} content";
        let result = loader.substitute_env_vars(content).unwrap();
        assert_eq!(result, content);
    }

    #[test]
    fn test_get_default_config_path() {
        let path = get_default_config_path();
        assert!(path.to_string_lossy().contains("config.toml"));
    }
}
