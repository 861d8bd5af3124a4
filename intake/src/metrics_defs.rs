use shared::metrics_defs::{MetricDef, MetricType};

pub const SUBMISSION_CREATED: MetricDef = MetricDef {
    name: "submission.created",
    metric_type: MetricType::Counter,
    description: "Consultation requests stored",
};

pub const TRACKING_CREATED: MetricDef = MetricDef {
    name: "tracking.created",
    metric_type: MetricType::Counter,
    description: "Tracking events stored",
};

pub const REQUEST_REJECTED: MetricDef = MetricDef {
    name: "request.rejected",
    metric_type: MetricType::Counter,
    description: "Requests answered with an error. Tagged with endpoint, reason.",
};

pub const NOTIFICATION_OUTCOME: MetricDef = MetricDef {
    name: "notification.outcome",
    metric_type: MetricType::Counter,
    description: "Notification attempts. Tagged with channel, outcome.",
};

pub const REQUEST_DURATION: MetricDef = MetricDef {
    name: "request.duration",
    metric_type: MetricType::Histogram,
    description: "Request duration in seconds. Tagged with endpoint.",
};

pub const ALL_METRICS: &[MetricDef] = &[
    SUBMISSION_CREATED,
    TRACKING_CREATED,
    REQUEST_REJECTED,
    NOTIFICATION_OUTCOME,
    REQUEST_DURATION,
];
