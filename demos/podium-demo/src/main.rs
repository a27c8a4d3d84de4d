//! # Podium 演示应用
//!
//! 扫描订单模块、织入事务与计时切面、按请求划分逻辑单元处理下单。

mod app;

use aop::Advisable;
use anyhow::Context;
use clap::Parser;
use di_abstractions::{ComponentContainer, ContainerExt};
use di_impl::{ApplicationContainer, ContainerConfig};
use infrastructure_common::LogicalUnit;
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// 命令行参数
#[derive(Parser, Debug)]
#[command(name = "podium-demo")]
#[command(about = "Podium IoC 容器演示")]
struct Args {
    /// 容器配置文件（JSON）
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// 模拟请求数
    #[arg(short, long, default_value_t = 4)]
    requests: u64,

    /// 日志级别
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // 初始化日志
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level)))
        .init();

    info!("启动 Podium 演示应用");

    let container = build_container(&args)?;
    container.start().context("容器启动失败")?;
    info!("容器已启动，共 {} 个组件", container.definitions().len());

    let handles: Vec<_> = (0..args.requests)
        .map(|index| {
            let container = container.clone();
            tokio::spawn(async move { handle_request(&container, index) })
        })
        .collect();

    for handle in handles {
        match handle.await? {
            Ok(summary) => info!("请求完成: {}", summary),
            Err(error) => warn!("请求失败: {:#}", error),
        }
    }

    let service = container.resolve_named::<dyn Advisable>("order_service")?;
    info!("订单统计: {}", service.invoke("count", vec![])?);

    container.stop().context("容器停止失败")?;
    info!("应用已关闭");
    Ok(())
}

/// 构建容器并登记组件
fn build_container(args: &Args) -> anyhow::Result<Arc<ApplicationContainer>> {
    let config = match &args.config {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("无法读取配置文件: {}", path.display()))?;
            let value: serde_json::Value = serde_json::from_str(&raw)
                .with_context(|| format!("配置文件不是合法的 JSON: {}", path.display()))?;
            ContainerConfig::from_value(value).context("容器配置无效")?
        }
        None => ContainerConfig::default(),
    };

    let container = ApplicationContainer::with_config(config);
    let registered = container.scan(&app::catalog(), &[app::LOCATION])?;
    info!("扫描 {} 得到 {} 个组件", app::LOCATION, registered);
    container.register_aspect(app::timing_aspect())?;
    Ok(container)
}

/// 在独立的逻辑单元中处理一个请求
fn handle_request(container: &ApplicationContainer, index: u64) -> anyhow::Result<String> {
    let unit = LogicalUnit::new(format!("request-{index}"));
    let result = place_order(container, &unit, index);
    container.reset_logical_unit(unit.id);
    result
}

fn place_order(container: &ApplicationContainer, unit: &LogicalUnit, index: u64) -> anyhow::Result<String> {
    let trace = container.resolve_in::<app::RequestTrace>(unit.id)?;
    let service = container.resolve_named::<dyn Advisable>("order_service")?;

    // 每第三个请求数量为 0，触发回滚
    let quantity = if index % 3 == 2 { 0 } else { index + 1 };
    let order = service
        .invoke("place", vec![json!(format!("item-{index}")), json!(quantity)])
        .with_context(|| format!("请求 {} 下单失败", trace.id))?;
    Ok(format!("{} -> {} ({} ms)", trace.id, order, trace.elapsed_ms()))
}
