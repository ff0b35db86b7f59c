//! Network quality score.
//!
//! Weighted blend of four 0–100 sub-scores:
//!   ping 30%, jitter 20%, download 30%, upload 20%
//! minus 10 points per percent of packet loss, clamped to 0–100.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NetworkQualityInput {
    pub ping: f64,
    pub jitter: f64,
    pub download_mbps: f64,
    pub upload_mbps: f64,
    #[serde(default)]
    pub packet_loss: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub category: String,
    pub label: String,
    pub icon: String,
    pub suitable: bool,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkQuality {
    pub overall_score: i64,
    pub grade: String,
    pub grade_label: String,
    pub ping_score: i64,
    pub jitter_score: i64,
    pub download_score: i64,
    pub upload_score: i64,
    pub recommendations: Vec<Recommendation>,
    pub summary: String,
}

pub fn calculate_network_quality(input: &NetworkQualityInput) -> NetworkQuality {
    let ping_score = (100.0 - (input.ping - 10.0) * 2.0).clamp(0.0, 100.0);
    let jitter_score = (100.0 - input.jitter * 5.0).clamp(0.0, 100.0);
    let download_score = input.download_mbps.min(100.0);
    let upload_score = (input.upload_mbps * 2.0).min(100.0);

    let overall = (ping_score * 0.30
        + jitter_score * 0.20
        + download_score * 0.30
        + upload_score * 0.20
        - input.packet_loss * 10.0)
        .clamp(0.0, 100.0);

    let (grade, grade_label) = grade_for(overall);
    let recommendations = recommendations_for(input);
    let summary = summary_for(overall, &recommendations);

    NetworkQuality {
        overall_score: overall as i64,
        grade: grade.to_string(),
        grade_label: grade_label.to_string(),
        ping_score: ping_score as i64,
        jitter_score: jitter_score as i64,
        download_score: download_score as i64,
        upload_score: upload_score as i64,
        recommendations,
        summary,
    }
}

pub fn grade_for(score: f64) -> (&'static str, &'static str) {
    match score {
        s if s >= 90.0 => ("A+", "Exceptional"),
        s if s >= 80.0 => ("A", "Excellent"),
        s if s >= 70.0 => ("B", "Good"),
        s if s >= 60.0 => ("C", "Fair"),
        s if s >= 50.0 => ("D", "Poor"),
        _ => ("F", "Very Poor"),
    }
}

fn recommendation(
    category: &str,
    label: &str,
    icon: &str,
    suitable: bool,
    description: &str,
) -> Recommendation {
    Recommendation {
        category: category.to_string(),
        label: label.to_string(),
        icon: icon.to_string(),
        suitable,
        description: description.to_string(),
    }
}

fn recommendations_for(input: &NetworkQualityInput) -> Vec<Recommendation> {
    let NetworkQualityInput {
        ping,
        jitter,
        download_mbps: down,
        upload_mbps: up,
        packet_loss,
    } = *input;

    let gaming = ping < 50.0 && jitter < 15.0 && packet_loss < 1.0;
    let gaming_desc = match gaming {
        true if ping < 20.0 && jitter < 5.0 => "Ideal for competitive gaming with minimal latency",
        true => "Good for online gaming with stable connection",
        false => "May experience lag in fast-paced online games",
    };

    let streaming = down >= 25.0 && jitter < 30.0;
    let streaming_desc = match streaming {
        true if down >= 50.0 => "Perfect for 4K HDR streaming on multiple devices",
        true => "Suitable for 4K streaming on one device",
        false => "May buffer during 4K playback, HD recommended",
    };

    let video = up >= 3.0 && ping < 150.0 && jitter < 50.0;
    let video_desc = match video {
        true if up >= 10.0 && ping < 50.0 => "Excellent for HD group video conferencing",
        true => "Good for standard video calls",
        false => "May experience quality issues in video calls",
    };

    let wfh = down >= 10.0 && up >= 5.0 && ping < 100.0;
    let wfh_desc = match wfh {
        true if down >= 50.0 && up >= 20.0 => "Perfect for remote work with large file transfers",
        true => "Suitable for standard remote work tasks",
        false => "Consider upgrading for better remote work experience",
    };

    let live = up >= 10.0 && ping < 100.0 && jitter < 20.0;
    let live_desc = match live {
        true if up >= 25.0 => "Great for 1080p live streaming to platforms",
        true => "Suitable for 720p live streaming",
        false => "Upload speed may limit streaming quality",
    };

    let cloud = ping < 40.0 && jitter < 10.0 && down >= 35.0;
    let cloud_desc = if cloud {
        "Ideal for cloud gaming services like GeForce NOW"
    } else {
        "May experience input lag in cloud gaming"
    };

    vec![
        recommendation("gaming", "Gaming", "🎮", gaming, gaming_desc),
        recommendation("streaming_4k", "4K Streaming", "📺", streaming, streaming_desc),
        recommendation("video_calls", "Video Calls", "📹", video, video_desc),
        recommendation("work_from_home", "Remote Work", "💼", wfh, wfh_desc),
        recommendation("live_streaming", "Live Streaming", "🎥", live, live_desc),
        recommendation("cloud_gaming", "Cloud Gaming", "☁️", cloud, cloud_desc),
    ]
}

fn summary_for(score: f64, recommendations: &[Recommendation]) -> String {
    let suitable = recommendations.iter().filter(|r| r.suitable).count();
    let total = recommendations.len();
    match score {
        s if s >= 90.0 => format!(
            "Exceptional connection! Your network excels at all {suitable}/{total} tested activities."
        ),
        s if s >= 80.0 => format!(
            "Excellent connection suitable for {suitable}/{total} activities with great performance."
        ),
        s if s >= 70.0 => format!("Good connection handling {suitable}/{total} activities well."),
        s if s >= 60.0 => format!(
            "Fair connection. Works for {suitable}/{total} activities but may have limitations."
        ),
        s if s >= 50.0 => format!(
            "Below average connection. Only {suitable}/{total} activities may work smoothly."
        ),
        _ => "Poor connection quality. Consider troubleshooting or upgrading your network."
            .to_string(),
    }
}
