#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricType {
    Counter,
    Gauge,
}

impl MetricType {
    pub const fn as_str(&self) -> &'static str {
        match self {
            MetricType::Counter => "Counter",
            MetricType::Gauge => "Gauge",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct MetricDef {
    pub name: &'static str,
    pub metric_type: MetricType,
    pub description: &'static str,
}

pub const ANALYSIS_DEDUP_JOIN: MetricDef = MetricDef {
    name: "analysis.dedup.join",
    metric_type: MetricType::Counter,
    description: "Analysis call joined an entry already in flight for its key",
};

pub const ANALYSIS_DEDUP_START: MetricDef = MetricDef {
    name: "analysis.dedup.start",
    metric_type: MetricType::Counter,
    description: "Analysis call started a fresh underlying operation",
};

pub const ANALYSIS_INFLIGHT: MetricDef = MetricDef {
    name: "analysis.inflight",
    metric_type: MetricType::Gauge,
    description: "Entries currently tracked by the in-flight registry",
};

pub const AUTH_REFRESH_ATTEMPT: MetricDef = MetricDef {
    name: "auth.refresh.attempt",
    metric_type: MetricType::Counter,
    description: "Auth refresh triggered after an authentication challenge",
};

pub const AUTH_REFRESH_FAILURE: MetricDef = MetricDef {
    name: "auth.refresh.failure",
    metric_type: MetricType::Counter,
    description: "Auth refresh failed to produce a valid session",
};

pub const AUTH_RETRIES: MetricDef = MetricDef {
    name: "auth.retries",
    metric_type: MetricType::Counter,
    description: "Operations reissued after a successful refresh",
};

pub const ALL_METRICS: &[MetricDef] = &[
    ANALYSIS_DEDUP_JOIN,
    ANALYSIS_DEDUP_START,
    ANALYSIS_INFLIGHT,
    AUTH_REFRESH_ATTEMPT,
    AUTH_REFRESH_FAILURE,
    AUTH_RETRIES,
];
