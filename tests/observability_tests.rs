use topup_gateway::observability::{
    mask_sensitive, AggregatedHealth, DependencyHealth, HealthStatus, LatencyTimer, LogConfig,
    LogFormat, Metrics,
};

#[test]
fn test_log_config_default() {
    let config = LogConfig::default();
    assert_eq!(config.level, "info");
    assert_eq!(config.format, LogFormat::Pretty);
    assert!(config.include_target);
    assert!(!config.include_file);
    assert!(!config.include_line);
}

#[test]
fn test_log_format_from_str() {
    assert_eq!(LogFormat::from("json"), LogFormat::Json);
    assert_eq!(LogFormat::from("JSON"), LogFormat::Json);
    assert_eq!(LogFormat::from("compact"), LogFormat::Compact);
    assert_eq!(LogFormat::from("COMPACT"), LogFormat::Compact);
    assert_eq!(LogFormat::from("pretty"), LogFormat::Pretty);
    assert_eq!(LogFormat::from("unknown"), LogFormat::Pretty);
}

#[test]
fn test_mask_sensitive_short_string() {
    assert_eq!(mask_sensitive("abc", 2), "***");
}

#[test]
fn test_mask_sensitive_exact_boundary() {
    assert_eq!(mask_sensitive("1234", 2), "****");
}

#[test]
fn test_mask_sensitive_long_string() {
    assert_eq!(mask_sensitive("1234567890", 2), "12******90");
}

#[test]
fn test_mask_sensitive_keeps_signature_length() {
    let signature = "a".repeat(64);
    let masked = mask_sensitive(&signature, 8);
    assert_eq!(masked.len(), 64);
    assert!(masked.starts_with("aaaaaaaa"));
    assert!(masked.ends_with("aaaaaaaa"));
    assert!(masked.contains('*'));
}

#[test]
fn test_metrics_callback_recording() {
    let metrics = Metrics::new();
    metrics.record_callback_received("applied");
    metrics.record_callback_received("duplicate");
    metrics.record_callback_received("conflict");
    metrics.record_callback_rejected("mismatch");
    metrics.record_callback_latency(12.5);
}

#[test]
fn test_metrics_transition_recording() {
    let metrics = Metrics::new();
    metrics.record_transition("PENDING", "PAID");
    metrics.record_transition("PAID", "REFUNDED");
    metrics.record_wallet_credit();
    metrics.record_topup_created("qris");
}

#[test]
fn test_metrics_provider_recording() {
    let metrics = Metrics::new();
    metrics.record_provider_request("create_payment", true, 50.0);
    metrics.record_provider_request("payment_detail", false, 120.0);
}

#[test]
fn test_latency_timer() {
    let timer = LatencyTimer::new();
    std::thread::sleep(std::time::Duration::from_millis(10));
    assert!(timer.elapsed_ms() >= 10.0);
}

#[test]
fn test_health_status_checks() {
    assert!(HealthStatus::Healthy.is_healthy());
    assert!(!HealthStatus::Healthy.is_degraded());
    assert!(!HealthStatus::Healthy.is_unhealthy());

    assert!(!HealthStatus::Degraded.is_healthy());
    assert!(HealthStatus::Degraded.is_degraded());
    assert!(!HealthStatus::Degraded.is_unhealthy());

    assert!(!HealthStatus::Unhealthy.is_healthy());
    assert!(!HealthStatus::Unhealthy.is_degraded());
    assert!(HealthStatus::Unhealthy.is_unhealthy());
}

#[test]
fn test_dependency_health_constructors() {
    let healthy = DependencyHealth::healthy("database", 5.0);
    assert_eq!(healthy.name, "database");
    assert_eq!(healthy.status, HealthStatus::Healthy);
    assert_eq!(healthy.latency_ms, Some(5.0));
    assert!(healthy.message.is_none());

    let degraded = DependencyHealth::degraded("database", "High latency");
    assert_eq!(degraded.status, HealthStatus::Degraded);
    assert!(degraded.latency_ms.is_none());
    assert_eq!(degraded.message, Some("High latency".to_string()));

    let unhealthy = DependencyHealth::unhealthy("database", "Connection timeout");
    assert_eq!(unhealthy.status, HealthStatus::Unhealthy);
    assert_eq!(unhealthy.message, Some("Connection timeout".to_string()));
}

#[test]
fn test_aggregated_health_all_healthy() {
    let dependencies = vec![DependencyHealth::healthy("database", 5.0)];
    let health = AggregatedHealth::new("1.0.0".to_string(), 3600, dependencies);

    assert_eq!(health.status, HealthStatus::Healthy);
    assert_eq!(health.version, "1.0.0");
    assert_eq!(health.uptime_seconds, 3600);
    assert_eq!(health.dependencies.len(), 1);
}

#[test]
fn test_aggregated_health_degraded_dependency() {
    let dependencies = vec![DependencyHealth::degraded("database", "High latency")];
    let health = AggregatedHealth::new("1.0.0".to_string(), 3600, dependencies);
    assert_eq!(health.status, HealthStatus::Degraded);
}

#[test]
fn test_aggregated_health_unhealthy_dependency() {
    let dependencies = vec![
        DependencyHealth::degraded("database", "High latency"),
        DependencyHealth::unhealthy("provider", "Connection refused"),
    ];
    let health = AggregatedHealth::new("1.0.0".to_string(), 3600, dependencies);
    assert_eq!(health.status, HealthStatus::Unhealthy);
}

#[test]
fn test_aggregated_health_empty_dependencies() {
    let health = AggregatedHealth::new("1.0.0".to_string(), 0, vec![]);
    assert_eq!(health.status, HealthStatus::Healthy);
    assert!(health.dependencies.is_empty());
}

#[test]
fn test_health_status_serialization() {
    assert_eq!(
        serde_json::to_string(&HealthStatus::Healthy).unwrap(),
        "\"healthy\""
    );
    assert_eq!(
        serde_json::to_string(&HealthStatus::Degraded).unwrap(),
        "\"degraded\""
    );
    assert_eq!(
        serde_json::to_string(&HealthStatus::Unhealthy).unwrap(),
        "\"unhealthy\""
    );
}

#[test]
fn test_dependency_health_serialization() {
    let health = DependencyHealth::healthy("database", 5.5);
    let json = serde_json::to_string(&health).unwrap();

    assert!(json.contains("\"name\":\"database\""));
    assert!(json.contains("\"status\":\"healthy\""));
    assert!(json.contains("\"latency_ms\":5.5"));
}

#[test]
fn test_aggregated_health_serialization() {
    let dependencies = vec![DependencyHealth::healthy("database", 5.0)];
    let health = AggregatedHealth::new("1.0.0".to_string(), 100, dependencies);
    let json = serde_json::to_string(&health).unwrap();

    assert!(json.contains("\"status\":\"healthy\""));
    assert!(json.contains("\"version\":\"1.0.0\""));
    assert!(json.contains("\"uptime_seconds\":100"));
    assert!(json.contains("\"dependencies\""));
}
