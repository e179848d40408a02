use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single line of `trades.jsonl`. Tagged on `type` so an append-only
/// reader can distinguish open/close without a schema lookup.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TradeEvent {
    Open(OpenEvent),
    Close(CloseEvent),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OpenEvent {
    pub ts: DateTime<Utc>,
    pub symbol: String,
    pub timeframe: String,
    pub dir: i8,
    pub entry_px: f64,
    pub risk_mult: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub regime: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub risk_band: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CloseEvent {
    pub ts: DateTime<Utc>,
    pub pct: f64,
    pub fee_bps: f64,
    pub slip_bps: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry_px: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_px: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_conf: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub regime: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub risk_band: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub risk_mult: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_scratch: Option<bool>,
}

/// A single line of `equity_curve.jsonl`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct EquityPoint {
    pub ts: DateTime<Utc>,
    pub equity: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_event_serializes_with_type_tag() {
        let ev = TradeEvent::Open(OpenEvent {
            ts: Utc::now(),
            symbol: "ETHUSDT".into(),
            timeframe: "1h".into(),
            dir: 1,
            entry_px: 2500.0,
            risk_mult: 1.0,
            regime: None,
            risk_band: None,
            confidence: None,
        });
        let v = serde_json::to_value(&ev).unwrap();
        assert_eq!(v["type"], "open");
        assert!(v.get("regime").is_none());
    }

    #[test]
    fn close_event_round_trips() {
        let ev = TradeEvent::Close(CloseEvent {
            ts: Utc::now(),
            pct: 0.12,
            fee_bps: 12.0,
            slip_bps: 2.0,
            entry_px: Some(100.0),
            exit_px: Some(100.12),
            exit_reason: Some("tp".into()),
            exit_conf: Some(0.9),
            regime: Some("trend_up".into()),
            risk_band: Some("A".into()),
            risk_mult: Some(1.0),
            is_scratch: Some(false),
        });
        let s = serde_json::to_string(&ev).unwrap();
        let back: TradeEvent = serde_json::from_str(&s).unwrap();
        assert_eq!(back, ev);
    }
}
