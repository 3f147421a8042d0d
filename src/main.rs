//! Uptime Vitals 主程序入口
//!
//! HTTP端点可用性监控工具

#[tokio::main]
async fn main() {
    match uptime_vitals::core::app::main().await {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            tracing::error!("命令执行失败: {:#}", e);
            eprintln!("错误: {e:#}");
            std::process::exit(1);
        }
    }
}
