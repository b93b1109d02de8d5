//! Fan-out Buffer Set: eight bounded channels between the decode/convert
//! producers and the Batch Coordinator (spec §4.3).
//!
//! Grounded on the mpsc/`CancellationToken` plumbing in the mmoldb
//! ingest reference: bounded channels provide backpressure for free —
//! if the coordinator falls behind, `send` blocks, which blocks the
//! gunzip read loop, pacing the whole pipeline to its slowest consumer.
//! MasterGenre/ReleaseGenre associations are not channels here; they are
//! produced directly by the Genre/Style Manager's second pass (§4.5).

use discogs_core::model::{Artist, Image, Label, Master, MasterArtist, Release, ReleaseArtist, ReleaseLabel};
use tokio::sync::mpsc;

/// The producer-side half of the fan-out set: one [`mpsc::Sender`] per
/// entity/association family.
#[derive(Clone)]
pub struct FanoutSenders {
    pub labels: mpsc::Sender<Label>,
    pub artists: mpsc::Sender<Artist>,
    pub masters: mpsc::Sender<Master>,
    pub releases: mpsc::Sender<Release>,
    pub images: mpsc::Sender<Image>,
    pub master_artists: mpsc::Sender<MasterArtist>,
    pub release_artists: mpsc::Sender<ReleaseArtist>,
    pub release_labels: mpsc::Sender<ReleaseLabel>,
}

/// The consumer-side half; handed to the Batch Coordinator, which owns
/// exactly one receiver per channel (spec §5: multiple-producer-single-
/// consumer is sufficient).
pub struct FanoutReceivers {
    pub labels: mpsc::Receiver<Label>,
    pub artists: mpsc::Receiver<Artist>,
    pub masters: mpsc::Receiver<Master>,
    pub releases: mpsc::Receiver<Release>,
    pub images: mpsc::Receiver<Image>,
    pub master_artists: mpsc::Receiver<MasterArtist>,
    pub release_artists: mpsc::Receiver<ReleaseArtist>,
    pub release_labels: mpsc::Receiver<ReleaseLabel>,
}

/// Builds the eight channels, each with the given capacity (spec §4.3:
/// 10,000 in production; tests use much smaller values to exercise
/// backpressure cheaply).
#[must_use]
pub fn build_fanout(capacity: usize) -> (FanoutSenders, FanoutReceivers) {
    let (labels_tx, labels_rx) = mpsc::channel(capacity);
    let (artists_tx, artists_rx) = mpsc::channel(capacity);
    let (masters_tx, masters_rx) = mpsc::channel(capacity);
    let (releases_tx, releases_rx) = mpsc::channel(capacity);
    let (images_tx, images_rx) = mpsc::channel(capacity);
    let (master_artists_tx, master_artists_rx) = mpsc::channel(capacity);
    let (release_artists_tx, release_artists_rx) = mpsc::channel(capacity);
    let (release_labels_tx, release_labels_rx) = mpsc::channel(capacity);

    (
        FanoutSenders {
            labels: labels_tx,
            artists: artists_tx,
            masters: masters_tx,
            releases: releases_tx,
            images: images_tx,
            master_artists: master_artists_tx,
            release_artists: release_artists_tx,
            release_labels: release_labels_tx,
        },
        FanoutReceivers {
            labels: labels_rx,
            artists: artists_rx,
            masters: masters_rx,
            releases: releases_rx,
            images: images_rx,
            master_artists: master_artists_rx,
            release_artists: release_artists_rx,
            release_labels: release_labels_rx,
        },
    )
}
