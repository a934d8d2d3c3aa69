//! The owned session: the only write path to selection and area state.
//!
//! Every mutator applies its change synchronously, then returns the refresh
//! that change requires. Clears (empty selection, area without a value) are
//! published before the mutator returns; fetches run when the returned future
//! is awaited or spawned.

use crate::aggregate::{Aggregate, CycleReport, ResultAggregator};
use crate::area::{AreaSelector, DrawStyle, DrawingTool, Transition};
use crate::layers::{auxiliary_layers, main_markers, AuxiliaryLayers, MarkerSpec, Summary};
use crate::published::Published;
use crate::selection::SelectionSet;
use futures::future::{self, BoxFuture};
use futures::FutureExt;
use geojson::Geometry;
use imap_api::QueryApi;
use imap_core::{
    AreaDescriptor, AreaKind, AuxQueryId, Bounds, MainQueryId, MapFrame, RegionOutline,
    DEFAULT_FRAME,
};
use log::warn;
use std::future::IntoFuture;
use std::sync::Arc;
use tokio::sync::watch;

/// Pending refresh of one aggregate.
pub type Refresh<K> = BoxFuture<'static, CycleReport<K>>;

/// Result of an area event: the transition, plus the auxiliary and outline
/// refresh it triggered. Awaiting yields the auxiliary cycle report, or
/// `None` when the area did not change.
#[must_use = "the auxiliary refresh only runs when awaited or spawned"]
pub struct AreaUpdate {
    pub transition: Transition,
    refresh: Option<BoxFuture<'static, CycleReport<AuxQueryId>>>,
}

impl AreaUpdate {
    fn unchanged(transition: Transition) -> Self {
        Self {
            transition,
            refresh: None,
        }
    }
}

impl IntoFuture for AreaUpdate {
    type Output = Option<CycleReport<AuxQueryId>>;
    type IntoFuture = BoxFuture<'static, Self::Output>;

    fn into_future(self) -> Self::IntoFuture {
        match self.refresh {
            Some(refresh) => refresh.map(Some).boxed(),
            None => future::ready(None).boxed(),
        }
    }
}

pub struct Session {
    api: Arc<dyn QueryApi>,
    frame: MapFrame,
    bounds: Option<Bounds>,
    main_selection: SelectionSet<MainQueryId>,
    auxiliary_selection: SelectionSet<AuxQueryId>,
    area: AreaSelector,
    main: ResultAggregator<MainQueryId>,
    auxiliary: ResultAggregator<AuxQueryId>,
    outline: Arc<Published<Option<RegionOutline>>>,
}

impl Session {
    pub fn new(api: Arc<dyn QueryApi>, tool: Box<dyn DrawingTool>) -> Self {
        Self {
            api,
            frame: DEFAULT_FRAME,
            bounds: None,
            main_selection: SelectionSet::new(),
            auxiliary_selection: SelectionSet::new(),
            area: AreaSelector::new(tool),
            main: ResultAggregator::new("main"),
            auxiliary: ResultAggregator::new("auxiliary"),
            outline: Arc::new(Published::new(None)),
        }
    }

    pub fn with_draw_style(mut self, style: DrawStyle) -> Self {
        self.area = self.area.with_style(style);
        self
    }

    pub fn frame(&self) -> &MapFrame {
        &self.frame
    }

    pub fn main_selection(&self) -> &SelectionSet<MainQueryId> {
        &self.main_selection
    }

    pub fn auxiliary_selection(&self) -> &SelectionSet<AuxQueryId> {
        &self.auxiliary_selection
    }

    pub fn area(&self) -> &AreaDescriptor {
        self.area.descriptor()
    }

    pub fn bounds(&self) -> Option<Bounds> {
        self.bounds
    }

    pub fn toggle_main_query(&mut self, id: MainQueryId) -> Refresh<MainQueryId> {
        self.main_selection.toggle(id);
        self.refresh_main()
    }

    /// Restrict main fetches to `bounds`; `None` fetches everything.
    pub fn set_bounds(&mut self, bounds: Option<Bounds>) -> Refresh<MainQueryId> {
        self.bounds = bounds;
        self.refresh_main()
    }

    /// Re-run the main cycle for the current selection.
    pub fn refresh_main(&self) -> Refresh<MainQueryId> {
        let api = Arc::clone(&self.api);
        let bounds = self.bounds;
        self.main.run(self.main_selection.to_vec(), move |id| {
            let api = Arc::clone(&api);
            async move { api.fetch_main_query_result(id, bounds).await }
        })
    }

    pub fn toggle_auxiliary_query(&mut self, id: AuxQueryId) -> Refresh<AuxQueryId> {
        self.auxiliary_selection.toggle(id);
        self.refresh_auxiliary()
    }

    /// Re-run the auxiliary cycle, or clear it while the area has no value.
    pub fn refresh_auxiliary(&self) -> Refresh<AuxQueryId> {
        let Some(filter) = self.area.descriptor().filter() else {
            return future::ready(self.auxiliary.clear()).boxed();
        };
        let api = Arc::clone(&self.api);
        let filter = Arc::new(filter);
        self.auxiliary.run(self.auxiliary_selection.to_vec(), move |id| {
            let api = Arc::clone(&api);
            let filter = Arc::clone(&filter);
            async move { api.fetch_auxiliary_query_result(id, &filter).await }
        })
    }

    pub fn choose_area_mode(&mut self, kind: AreaKind) -> AreaUpdate {
        let transition = self.area.choose_mode(kind);
        self.after_area_event(transition)
    }

    pub fn select_named_region(&mut self, name: Option<String>) -> AreaUpdate {
        let transition = self.area.select_named_region(name);
        self.after_area_event(transition)
    }

    /// # Errors
    ///
    /// `Error::GeometryInvalid` for a malformed polygon; nothing is refreshed.
    pub fn on_polygon_created(&mut self, geometry: Geometry) -> imap_core::Result<AreaUpdate> {
        let transition = self.area.on_polygon_created(geometry)?;
        Ok(self.after_area_event(transition))
    }

    /// # Errors
    ///
    /// Same as [`Session::on_polygon_created`].
    pub fn on_polygon_edited(&mut self, geometry: Geometry) -> imap_core::Result<AreaUpdate> {
        let transition = self.area.on_polygon_edited(geometry)?;
        Ok(self.after_area_event(transition))
    }

    pub fn on_polygon_deleted(&mut self) -> AreaUpdate {
        let transition = self.area.on_polygon_deleted();
        self.after_area_event(transition)
    }

    pub fn clear_area(&mut self) -> AreaUpdate {
        let transition = self.area.clear();
        self.after_area_event(transition)
    }

    fn after_area_event(&self, transition: Transition) -> AreaUpdate {
        if !transition.is_changed() {
            return AreaUpdate::unchanged(transition);
        }
        let auxiliary = self.refresh_auxiliary();
        let outline = self.refresh_outline();
        AreaUpdate {
            transition,
            refresh: Some(
                async move {
                    let (report, ()) = futures::join!(auxiliary, outline);
                    report
                }
                .boxed(),
            ),
        }
    }

    /// Load the outline of the selected named region; any other area state
    /// clears it immediately.
    fn refresh_outline(&self) -> BoxFuture<'static, ()> {
        let sequence = self.outline.begin();
        let AreaDescriptor::NamedRegion(Some(name)) = self.area.descriptor() else {
            self.outline.publish(sequence, None);
            self.outline.set_loading(sequence, false);
            return future::ready(()).boxed();
        };

        self.outline.set_loading(sequence, true);
        let name = name.clone();
        let api = Arc::clone(&self.api);
        let outline = Arc::clone(&self.outline);
        async move {
            let loaded = match api.fetch_named_region_geometry(&name).await {
                Ok(region) => Some(region),
                Err(e) => {
                    warn!("Failed to load outline of {}: {}", name, e);
                    None
                }
            };
            if outline.publish(sequence, loaded) {
                outline.set_loading(sequence, false);
            }
        }
        .boxed()
    }

    pub fn main_results(&self) -> Arc<Aggregate<MainQueryId>> {
        self.main.current()
    }

    pub fn auxiliary_results(&self) -> Arc<Aggregate<AuxQueryId>> {
        self.auxiliary.current()
    }

    pub fn subscribe_main(&self) -> watch::Receiver<Arc<Aggregate<MainQueryId>>> {
        self.main.subscribe()
    }

    pub fn subscribe_auxiliary(&self) -> watch::Receiver<Arc<Aggregate<AuxQueryId>>> {
        self.auxiliary.subscribe()
    }

    pub fn is_main_loading(&self) -> bool {
        self.main.is_loading()
    }

    pub fn is_auxiliary_loading(&self) -> bool {
        self.auxiliary.is_loading()
    }

    pub fn region_outline(&self) -> Arc<Option<RegionOutline>> {
        self.outline.get()
    }

    pub fn subscribe_region_outline(&self) -> watch::Receiver<Arc<Option<RegionOutline>>> {
        self.outline.subscribe()
    }

    /// True while the selected region's outline is being fetched.
    pub fn is_outline_loading(&self) -> bool {
        self.outline.is_loading()
    }

    pub fn subscribe_outline_loading(&self) -> watch::Receiver<bool> {
        self.outline.subscribe_loading()
    }

    pub fn main_summary(&self) -> Summary<MainQueryId> {
        Summary::of(&self.main.current())
    }

    pub fn main_markers(&self) -> Vec<MarkerSpec> {
        main_markers(&self.main.current())
    }

    pub fn auxiliary_layers(&self) -> AuxiliaryLayers {
        auxiliary_layers(&self.auxiliary.current())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::area::tests::{square, RecordingTool};
    use async_trait::async_trait;
    use imap_api::ApiError;
    use imap_core::{AreaFilter, AuxiliaryQuery, MainQuery, NamedRegion, QueryResult};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tokio::sync::oneshot;

    #[derive(Default)]
    struct FakeApi {
        /// Feature count per main query; absent ids fail.
        main: HashMap<i64, usize>,
        /// `(feature count, return type)` per auxiliary query.
        auxiliary: HashMap<i64, (usize, &'static str)>,
        regions: Vec<&'static str>,
        main_calls: AtomicUsize,
        auxiliary_areas: Mutex<Vec<AreaFilter>>,
        /// The first main fetch waits on this before answering.
        hold_first: Mutex<Option<oneshot::Receiver<()>>>,
    }

    fn result(query_id: i64, count: usize, tag: &str) -> QueryResult {
        let features: Vec<serde_json::Value> = (0..count)
            .map(|i| {
                serde_json::json!({
                    "geometry": {"coordinates": [-35.2, -5.8]},
                    "properties": {"id_instalacao": format!("I{}", i), "query_id": query_id,
                                   "query_cor": "#3B82F6", "tipo_alvo": "regular"}
                })
            })
            .collect();
        serde_json::from_value(serde_json::json!({
            "features": features,
            "metadata": {"query_id": query_id, "query_nome": format!("Q{}", query_id),
                         "tipo_retorno": tag}
        }))
        .unwrap()
    }

    fn not_found(query: impl ToString) -> ApiError {
        ApiError::Backend {
            query: query.to_string(),
            message: "Query not found".into(),
        }
    }

    #[async_trait]
    impl QueryApi for FakeApi {
        async fn list_main_queries(&self) -> imap_api::Result<Vec<MainQuery>> {
            Ok(Vec::new())
        }

        async fn fetch_main_query_result(
            &self,
            id: MainQueryId,
            _bounds: Option<Bounds>,
        ) -> imap_api::Result<QueryResult> {
            self.main_calls.fetch_add(1, Ordering::SeqCst);
            let gate = self.hold_first.lock().unwrap().take();
            if let Some(gate) = gate {
                let _ = gate.await;
            }
            match self.main.get(&id.0) {
                Some(count) => Ok(result(id.0, *count, "instalacao")),
                None => Err(not_found(id)),
            }
        }

        async fn list_auxiliary_queries(&self) -> imap_api::Result<Vec<AuxiliaryQuery>> {
            Ok(Vec::new())
        }

        async fn fetch_auxiliary_query_result(
            &self,
            id: AuxQueryId,
            area: &AreaFilter,
        ) -> imap_api::Result<QueryResult> {
            self.auxiliary_areas.lock().unwrap().push(area.clone());
            match self.auxiliary.get(&id.0) {
                Some((count, tag)) => Ok(result(id.0, *count, tag)),
                None => Err(not_found(id)),
            }
        }

        async fn list_named_regions(&self) -> imap_api::Result<Vec<NamedRegion>> {
            Ok(Vec::new())
        }

        async fn fetch_named_region_geometry(&self, name: &str) -> imap_api::Result<RegionOutline> {
            if self.regions.iter().any(|region| *region == name) {
                Ok(RegionOutline {
                    name: name.to_string(),
                    geometry: square(-36.0),
                })
            } else {
                Err(imap_core::Error::RegionNotFound(name.to_string()).into())
            }
        }
    }

    fn session(api: FakeApi) -> (Session, Arc<FakeApi>, RecordingTool) {
        let api = Arc::new(api);
        let tool = RecordingTool::default();
        let session = Session::new(api.clone(), Box::new(tool.clone()));
        (session, api, tool)
    }

    #[tokio::test]
    async fn single_main_query_fills_the_aggregate() {
        let (mut session, _, _) = session(FakeApi {
            main: HashMap::from([(1, 3)]),
            ..Default::default()
        });

        let report = session.toggle_main_query(MainQueryId(1)).await;
        assert!(report.applied);

        let results = session.main_results();
        assert_eq!(results.keys().collect::<Vec<_>>(), vec![MainQueryId(1)]);
        assert_eq!(results.get(&MainQueryId(1)).unwrap().len(), 3);
        assert_eq!(session.main_summary().total, 3);
        assert_eq!(session.main_markers().len(), 3);
    }

    #[tokio::test]
    async fn failed_query_is_omitted_not_fatal() {
        let (mut session, _, _) = session(FakeApi {
            main: HashMap::from([(1, 2)]),
            ..Default::default()
        });

        session.toggle_main_query(MainQueryId(1)).await;
        let report = session.toggle_main_query(MainQueryId(2)).await;

        assert!(report.applied);
        assert_eq!(report.failed, vec![MainQueryId(2)]);
        let results = session.main_results();
        assert_eq!(results.len(), 1);
        assert_eq!(results.get(&MainQueryId(1)).unwrap().len(), 2);
        assert!(!results.contains(&MainQueryId(2)));
        assert_eq!(results.failed(), &[MainQueryId(2)]);
        assert!(!session.is_main_loading());
    }

    #[tokio::test]
    async fn deselecting_the_last_query_clears_synchronously() {
        let (mut session, api, _) = session(FakeApi {
            main: HashMap::from([(1, 3)]),
            ..Default::default()
        });
        session.toggle_main_query(MainQueryId(1)).await;
        assert_eq!(session.main_results().len(), 1);

        let pending = session.toggle_main_query(MainQueryId(1));
        assert!(session.main_results().is_empty());
        assert!(!session.is_main_loading());
        pending.await;
        assert_eq!(api.main_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn late_cycle_does_not_overwrite_a_newer_one() {
        let (gate, held) = oneshot::channel();
        let (mut session, _, _) = session(FakeApi {
            main: HashMap::from([(1, 1), (2, 2)]),
            hold_first: Mutex::new(Some(held)),
            ..Default::default()
        });

        let mut first = session.toggle_main_query(MainQueryId(1));
        assert!(futures::poll!(&mut first).is_pending());

        let second = session.toggle_main_query(MainQueryId(2)).await;
        assert!(second.applied);
        assert_eq!(session.main_results().len(), 2);
        assert!(!session.is_main_loading());

        gate.send(()).unwrap();
        let first = first.await;
        assert!(!first.applied);
        assert_eq!(
            session.main_results().keys().collect::<Vec<_>>(),
            vec![MainQueryId(1), MainQueryId(2)]
        );
        assert!(!session.is_main_loading());
    }

    #[tokio::test]
    async fn auxiliary_results_follow_the_area() {
        let (mut session, api, tool) = session(FakeApi {
            auxiliary: HashMap::from([(7, (4, "instalacao"))]),
            regions: vec!["Natal"],
            ..Default::default()
        });

        // no area yet: nothing is fetched
        let report = session.toggle_auxiliary_query(AuxQueryId(7)).await;
        assert!(report.fetched.is_empty());
        assert!(api.auxiliary_areas.lock().unwrap().is_empty());

        session.choose_area_mode(AreaKind::NamedRegion).await;
        assert!(session.auxiliary_results().is_empty());

        let update = session.select_named_region(Some("Natal".into()));
        assert_eq!(update.transition, Transition::Changed);
        let report = update.await.unwrap();
        assert_eq!(report.fetched, vec![AuxQueryId(7)]);
        assert_eq!(
            api.auxiliary_areas.lock().unwrap().as_slice(),
            &[AreaFilter::NamedRegion("Natal".into())]
        );
        assert_eq!(session.auxiliary_results().feature_count(), 4);
        let outline = session.region_outline();
        assert_eq!((*outline).as_ref().map(|o| o.name.as_str()), Some("Natal"));

        // switching to polygon mode empties the area and the results at once
        let update = session.choose_area_mode(AreaKind::Polygon);
        assert_eq!(session.area(), &AreaDescriptor::Polygon(None));
        assert!(session.auxiliary_results().is_empty());
        assert!(session.region_outline().is_none());
        update.await;
        assert_eq!(session.auxiliary_selection().len(), 1);
        assert_eq!(tool.calls(), vec!["activate"]);
    }

    #[tokio::test]
    async fn drawn_polygon_scopes_auxiliary_fetches() {
        let (mut session, api, tool) = session(FakeApi {
            auxiliary: HashMap::from([(1, (3, "heatmap")), (2, (2, "instalacao"))]),
            ..Default::default()
        });
        session.choose_area_mode(AreaKind::Polygon).await;
        session.toggle_auxiliary_query(AuxQueryId(1)).await;
        session.toggle_auxiliary_query(AuxQueryId(2)).await;

        session.on_polygon_created(square(0.0)).unwrap().await;
        let layers = session.auxiliary_layers();
        assert_eq!(layers.heat.len(), 3);
        assert_eq!(layers.markers.len(), 2);
        assert!(api
            .auxiliary_areas
            .lock()
            .unwrap()
            .iter()
            .all(|area| area.kind() == AreaKind::Polygon));

        assert!(session.on_polygon_edited(square(f64::NAN)).is_err());
        assert!(session.area().has_value());
        assert_eq!(session.auxiliary_results().len(), 2);

        session.clear_area().await;
        assert!(session.auxiliary_results().is_empty());
        assert_eq!(tool.calls(), vec!["activate", "deactivate"]);
    }

    #[tokio::test]
    async fn unchanged_area_events_do_not_refetch() {
        let (mut session, api, _) = session(FakeApi {
            auxiliary: HashMap::from([(1, (1, "instalacao"))]),
            regions: vec!["Mossoró"],
            ..Default::default()
        });
        session.toggle_auxiliary_query(AuxQueryId(1)).await;
        session.choose_area_mode(AreaKind::NamedRegion).await;
        session.select_named_region(Some("Mossoró".into())).await;
        let calls = api.auxiliary_areas.lock().unwrap().len();

        assert!(session.choose_area_mode(AreaKind::NamedRegion).await.is_none());
        assert!(session.select_named_region(Some("Mossoró".into())).await.is_none());
        assert!(session.on_polygon_deleted().await.is_none());
        assert_eq!(api.auxiliary_areas.lock().unwrap().len(), calls);
    }

    #[tokio::test]
    async fn unknown_region_leaves_no_outline() {
        let (mut session, _, _) = session(FakeApi::default());
        session.choose_area_mode(AreaKind::NamedRegion).await;
        session.select_named_region(Some("Atlantida".into())).await;
        assert!(session.region_outline().is_none());
        assert!(session.area().has_value());
        assert!(!session.is_outline_loading());
    }

    #[tokio::test]
    async fn outline_loading_tracks_the_latest_region() {
        let (mut session, _, _) = session(FakeApi {
            regions: vec!["Natal"],
            ..Default::default()
        });
        let loading = session.subscribe_outline_loading();
        session.choose_area_mode(AreaKind::NamedRegion).await;
        assert!(!session.is_outline_loading());

        let update = session.select_named_region(Some("Natal".into()));
        assert!(session.is_outline_loading());
        assert!(*loading.borrow());
        update.await;
        assert!(!session.is_outline_loading());
        assert!(session.region_outline().is_some());

        // leaving the mode while a fetch is pending drops the flag at once
        let pending = session.select_named_region(Some("Parnamirim".into()));
        assert!(session.is_outline_loading());
        let cleared = session.clear_area();
        assert!(!session.is_outline_loading());
        pending.await;
        cleared.await;
        assert!(!session.is_outline_loading());
        assert!(session.region_outline().is_none());
    }
}
