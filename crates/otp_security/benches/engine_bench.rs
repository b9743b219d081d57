//! OTP Security Engine Benchmarks
//!
//! Hot paths called from the authentication flow: event append, metric
//! updates with score recomputation, and policy validation.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use otp_security::scoring::ScoringEngine;
use otp_security::{
    EventKind, EventLog, OtpChannel, OtpConfig, OtpSecurityEngine, SecurityMetrics, Severity,
};
use std::collections::HashMap;

/// Append into a log that is already at capacity, so every append evicts
fn bench_event_append(c: &mut Criterion) {
    let log = EventLog::new(1000);
    for _ in 0..1000 {
        log.append(EventKind::OtpReused, Severity::Low, None, HashMap::new());
    }

    c.bench_function("event_append_at_capacity", |b| {
        b.iter(|| {
            black_box(log.append(
                EventKind::MultipleAttempts,
                Severity::Medium,
                Some("rider-1".to_string()),
                HashMap::new(),
            ))
        });
    });
}

/// Metric update cost grows with the number of events in the scoring window
fn bench_report_generated(c: &mut Criterion) {
    let mut group = c.benchmark_group("report_otp_generated");
    for events in [0_usize, 100, 1000] {
        let engine = OtpSecurityEngine::with_defaults();
        for _ in 0..events {
            engine.log_event(EventKind::OtpReused, Severity::High, None, HashMap::new());
        }
        group.bench_with_input(BenchmarkId::from_parameter(events), &engine, |b, engine| {
            b.iter(|| black_box(engine.report_otp_generated()));
        });
    }
    group.finish();
}

fn bench_scoring(c: &mut Criterion) {
    let metrics = SecurityMetrics {
        total_generated: 10_000,
        total_expired: 1_700,
        total_failed: 600,
        average_usage_time_seconds: 95.0,
        expiration_rate_percent: 17.0,
        ..SecurityMetrics::default()
    };
    c.bench_function("score_compute", |b| {
        b.iter(|| black_box(ScoringEngine::compute(black_box(&metrics), &[])));
    });
}

fn bench_validate(c: &mut Criterion) {
    let engine = OtpSecurityEngine::with_defaults();
    let config = OtpConfig {
        expiry_seconds: 900,
        max_attempts: 7,
        resend_delay_seconds: 30,
        channel: OtpChannel::Sms,
    };
    c.bench_function("validate_config", |b| {
        b.iter(|| black_box(engine.validate_config(black_box(&config))));
    });
}

criterion_group!(
    engine_benches,
    bench_event_append,
    bench_report_generated,
    bench_scoring,
    bench_validate
);
criterion_main!(engine_benches);
