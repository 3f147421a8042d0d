//! 服务管理模块
//!
//! 负责配置加载、组件初始化和生命周期管理

use crate::cli::args::{Args, Commands};
use crate::config::{self, Config};
use crate::health::{CheckCoordinator, CheckQueue, HttpProber, Prober, Scheduler};
use crate::status::{EndpointRegistry, RetentionPolicy, StatusStore};
use crate::web::WebServer;
use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// 服务组件结构
pub struct ServiceComponents {
    /// 端点注册表与状态存储
    pub store: StatusStore,
    /// 检测协调器
    pub coordinator: Arc<CheckCoordinator>,
    /// 端点注册入口
    pub registry: EndpointRegistry,
    /// 即时检测分发任务
    pub queue_handle: JoinHandle<()>,
}

impl ServiceComponents {
    /// 使用默认HTTP探测器构建组件
    pub fn build(config: &Config) -> crate::error::Result<Self> {
        let prober = Arc::new(HttpProber::new(config.global.request_timeout())?);
        Ok(Self::with_prober(config, prober))
    }

    /// 使用给定探测器构建组件
    ///
    /// 必须在 tokio 运行时内调用，即时检测分发任务在这里启动。
    pub fn with_prober(config: &Config, prober: Arc<dyn Prober>) -> Self {
        let store = StatusStore::new(RetentionPolicy::from(&config.global));
        let coordinator = Arc::new(CheckCoordinator::new(store.clone(), prober));
        let (queue, queue_handle) = CheckQueue::start(
            Arc::clone(&coordinator),
            config.global.check_queue_capacity,
            config.global.max_concurrent_checks,
        );
        let registry = EndpointRegistry::new(store.clone(), queue);

        Self {
            store,
            coordinator,
            registry,
            queue_handle,
        }
    }

    /// 创建调度器
    pub fn scheduler(&self, config: &Config) -> Scheduler {
        Scheduler::new(
            Arc::clone(&self.coordinator),
            config.global.check_interval(),
            config.global.max_concurrent_checks,
        )
    }

    /// 注册配置文件中的端点
    pub async fn register_configured(&self, config: &Config) {
        for endpoint in &config.endpoints {
            self.registry.register(endpoint.clone()).await;
        }
    }
}

/// 服务启动器
pub struct ServiceLauncher;

impl ServiceLauncher {
    /// 加载配置并应用命令行覆盖
    pub async fn load_and_validate_config(args: &Args) -> Result<Config> {
        let mut config = config::resolve_config(args.config.as_deref())
            .await
            .context("加载配置文件失败")?;

        if let Commands::Start {
            interval,
            bind,
            port,
        } = &args.command
        {
            if let Some(interval) = interval {
                config.global.check_interval_seconds = *interval;
            }
            if let Some(bind) = bind {
                config.global.web.bind_address = bind.clone();
            }
            if let Some(port) = port {
                config.global.web.port = *port;
            }
        }

        config::validate_config(&config).map_err(|e| anyhow::anyhow!("配置验证失败: {}", e))?;
        Ok(config)
    }

    /// 启动Web服务器（如果启用）
    ///
    /// 绑定在这里同步完成，端口被占用时直接返回错误。
    pub async fn start_web_server_if_enabled(
        config: &Config,
        registry: &EndpointRegistry,
        shutdown_rx: broadcast::Receiver<()>,
    ) -> Result<Option<JoinHandle<()>>> {
        if !config.global.web.enabled {
            info!("Web服务器已禁用");
            return Ok(None);
        }

        let server = WebServer::new(config.global.web.clone(), registry.clone());
        let listener = server.bind().await.context("启动Web服务器失败")?;

        let handle = tokio::spawn(async move {
            if let Err(e) = server.serve(listener, shutdown_rx).await {
                error!("Web服务器运行失败: {}", e);
            }
        });

        Ok(Some(handle))
    }

    /// 运行全部组件直到收到关闭信号
    ///
    /// `shutdown_rx` 需在发送关闭信号之前创建，组件启动前到达的信号也不会丢失。
    pub async fn run(
        config: Config,
        shutdown_tx: broadcast::Sender<()>,
        shutdown_rx: broadcast::Receiver<()>,
    ) -> Result<()> {
        info!(
            "初始化服务组件，检测间隔: {}秒，端点数量: {}",
            config.global.check_interval_seconds,
            config.endpoints.len()
        );

        let components = ServiceComponents::build(&config).context("初始化服务组件失败")?;

        let web_handle = Self::start_web_server_if_enabled(
            &config,
            &components.registry,
            shutdown_tx.subscribe(),
        )
        .await?;

        components.register_configured(&config).await;

        let scheduler = components.scheduler(&config);
        let scheduler_handle = tokio::spawn(scheduler.run(shutdown_tx.subscribe()));

        Self::handle_shutdown_and_cleanup(
            shutdown_tx,
            shutdown_rx,
            components,
            scheduler_handle,
            web_handle,
        )
        .await
    }

    /// 处理关闭和清理
    async fn handle_shutdown_and_cleanup(
        shutdown_tx: broadcast::Sender<()>,
        mut shutdown_rx: broadcast::Receiver<()>,
        components: ServiceComponents,
        scheduler_handle: JoinHandle<()>,
        web_handle: Option<JoinHandle<()>>,
    ) -> Result<()> {
        info!("等待关闭信号...");
        let _ = shutdown_rx.recv().await;
        info!("收到关闭信号，正在停止服务...");

        // 信号可能早于调度器和Web服务器订阅，重新广播一次
        let _ = shutdown_tx.send(());

        if let Err(e) = scheduler_handle.await {
            error!("调度器停止时出错: {}", e);
        }

        if let Some(handle) = web_handle {
            if let Err(e) = handle.await {
                error!("Web服务器停止时出错: {}", e);
            }
        }

        // 正在执行的即时检测不取消，分发任务直接停止
        components.queue_handle.abort();

        info!("服务已停止");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::health::prober::testing::StaticProber;
    use crate::health::EndpointState;
    use crate::status::Endpoint;
    use std::time::Duration;

    fn config_with(endpoints: Vec<Endpoint>) -> Config {
        Config {
            endpoints,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_components_register_configured_endpoints() {
        let config = config_with(vec![
            Endpoint::new("a", "http://a.local"),
            Endpoint::new("b", "http://b.local"),
        ]);
        let prober = Arc::new(StaticProber::with("http://a.local", 200));
        let components = ServiceComponents::with_prober(&config, prober);

        components.register_configured(&config).await;
        assert_eq!(components.store.len().await, 2);

        let scheduler = components.scheduler(&config);
        assert_eq!(scheduler.interval(), Duration::from_secs(30));
        scheduler.run_pass().await;

        let snapshot = components.store.snapshot_all().await;
        assert_eq!(snapshot["a"].current_status, EndpointState::Up);
        assert_eq!(snapshot["b"].current_status, EndpointState::Down);
    }

    #[tokio::test]
    async fn test_explicit_missing_config_fails() {
        let args = Args {
            config: Some(std::path::PathBuf::from("/nonexistent/uptime-vitals.toml")),
            log_level: None,
            json_logs: false,
            command: Commands::Start {
                interval: Some(5),
                bind: None,
                port: None,
            },
        };

        assert!(ServiceLauncher::load_and_validate_config(&args).await.is_err());
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        let mut config = config_with(vec![]);
        config.global.web.enabled = false;

        let (shutdown_tx, shutdown_rx) = broadcast::channel(4);
        let handle = tokio::spawn(ServiceLauncher::run(config, shutdown_tx.clone(), shutdown_rx));

        tokio::time::sleep(Duration::from_millis(100)).await;
        shutdown_tx.send(()).unwrap();

        let result = tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .expect("服务未退出")
            .unwrap();
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_shutdown_sent_before_run_is_not_lost() {
        let mut config = config_with(vec![Endpoint::new("a", "http://127.0.0.1:1")]);
        config.global.web.enabled = false;

        let (shutdown_tx, shutdown_rx) = broadcast::channel(4);
        shutdown_tx.send(()).unwrap();

        let result = tokio::time::timeout(
            Duration::from_secs(5),
            ServiceLauncher::run(config, shutdown_tx, shutdown_rx),
        )
        .await
        .expect("服务未退出");
        assert!(result.is_ok());
    }
}
