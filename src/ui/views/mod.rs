mod anomalies;
mod cluster_detail;
mod clusters;
mod hotspots;
mod overview;
mod protocols;

pub use anomalies::AnomaliesView;
pub use cluster_detail::ClusterDetailView;
pub use clusters::ClustersView;
pub use hotspots::HotspotsView;
pub use overview::OverviewView;
pub use protocols::ProtocolsView;
