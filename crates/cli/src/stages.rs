//! Pipeline stages driven from a [`PipelineConfig`]

use crate::config::PipelineConfig;
use anyhow::{Context, Result, bail};
use covermap_algorithms::classification::{
    AccuracyReport, classify_stack, postprocess, train_and_evaluate,
};
use covermap_algorithms::features::assemble_feature_stack;
use covermap_algorithms::imagery::optical_composite;
use covermap_algorithms::sar::{RADAR_BANDS, median_dn, radar_composite};
use covermap_colormap::{VisParams, classes_to_rgba, stretch_rgb};
use covermap_core::BandStack;
use covermap_core::io::{
    AssetStore, Catalog, ExportParams, ImageCollection, composite_asset_name, export_raster,
    read_points, write_rgba_geotiff,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

const OPTICAL_KIND: &str = "Landsat";
const RADAR_KIND: &str = "PALSAR";
const QUICKLOOK: &str = "quicklook.tif";

pub(crate) fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

/// Files written for one classified epoch
#[derive(Debug, Clone)]
pub struct ClassificationOutputs {
    pub year: i32,
    pub map: PathBuf,
    pub accuracy: PathBuf,
    pub model: PathBuf,
    pub report: AccuracyReport,
}

/// Catalog, asset store and settings of one run
pub struct Pipeline<'a> {
    config: &'a PipelineConfig,
    catalog: Catalog,
    assets: AssetStore,
}

impl<'a> Pipeline<'a> {
    pub fn new(config: &'a PipelineConfig) -> Self {
        Self {
            config,
            catalog: Catalog::new(&config.catalog_root),
            assets: AssetStore::new(&config.asset_root),
        }
    }

    /// Build, clip and store the median optical composite of one epoch.
    pub fn build_optical(&self, year: i32) -> Result<PathBuf> {
        let epoch = self.config.optical_epoch(year)?;
        let sensor = &epoch.sensor;

        let mut merged: Option<ImageCollection> = None;
        for id in &sensor.collections {
            let collection = self
                .catalog
                .collection(id)
                .with_context(|| format!("Failed to open collection {}", id))?
                .filter_date(&epoch.dates);
            info!("{}: {} scenes in {}", id, collection.len(), epoch.dates);
            merged = Some(match merged {
                Some(m) => m.merge(collection),
                None => collection,
            });
        }
        let collection = merged.unwrap_or_default();
        if collection.is_empty() {
            bail!("No {} scenes between {}", sensor.name, epoch.dates);
        }

        let pb = spinner(&format!("Reading {} scenes...", collection.len()));
        let scenes = collection
            .iter()
            .map(|s| s.load(sensor.source_bands.as_slice()))
            .collect::<covermap_core::Result<Vec<BandStack>>>()
            .context("Failed to read scenes")?;
        pb.finish_and_clear();

        let composite = optical_composite(&scenes, sensor)
            .context("Failed to build optical composite")?
            .clip(&self.config.extent)
            .context("Composite does not overlap the study extent")?;
        let name = composite_asset_name(OPTICAL_KIND, &self.config.site, year);
        self.store(&name, &composite, &VisParams::landsat())
    }

    /// Calibrate, clip and store the radar composite of one epoch.
    pub fn build_radar(&self, year: i32) -> Result<PathBuf> {
        let epoch = self.config.radar_epoch(year)?;
        let collection = self
            .catalog
            .collection(&epoch.collection)
            .with_context(|| format!("Failed to open collection {}", epoch.collection))?
            .filter_date(&epoch.dates);
        if collection.is_empty() {
            bail!("No radar mosaics in {} between {}", epoch.collection, epoch.dates);
        }

        let pb = spinner("Reading radar mosaics...");
        let scenes = collection
            .iter()
            .map(|s| s.load(&RADAR_BANDS[..2]))
            .collect::<covermap_core::Result<Vec<BandStack>>>()
            .context("Failed to read radar mosaics")?;
        pb.finish_and_clear();

        let dn = median_dn(&scenes)?;
        let composite = radar_composite(dn.band("HH")?, dn.band("HV")?, &epoch.params)
            .context("Failed to build radar composite")?
            .clip(&self.config.extent)
            .context("Radar composite does not overlap the study extent")?;
        let name = composite_asset_name(RADAR_KIND, &self.config.site, year);
        self.store(&name, &composite, &VisParams::palsar())
    }

    fn store(&self, name: &str, stack: &BandStack, vis: &VisParams) -> Result<PathBuf> {
        let pb = spinner(&format!("Writing {}...", name));
        let dir = self
            .assets
            .write(name, stack)
            .with_context(|| format!("Failed to store {}", name))?;
        if self.config.quicklooks {
            let rgba = stretch_rgb(stack, vis)?;
            let (rows, cols) = stack.shape();
            write_rgba_geotiff(&rgba, rows, cols, &stack.transform(), stack.crs(), dir.join(QUICKLOOK))?;
        }
        pb.finish_and_clear();
        Ok(dir)
    }

    /// Train, evaluate, classify and export one epoch.
    ///
    /// Needs the optical and radar composites of `year` in the asset store.
    pub fn classify(&self, year: i32) -> Result<ClassificationOutputs> {
        let config = self.config;
        let optical_name = composite_asset_name(OPTICAL_KIND, &config.site, year);
        let radar_name = composite_asset_name(RADAR_KIND, &config.site, year);
        let optical = self
            .assets
            .read(&optical_name)
            .with_context(|| format!("Missing {}; run `covermap optical --year {}`", optical_name, year))?;
        let radar = self
            .assets
            .read(&radar_name)
            .with_context(|| format!("Missing {}; run `covermap radar --year {}`", radar_name, year))?;

        let stack = assemble_feature_stack(&optical, &radar, &config.texture)
            .context("Failed to assemble feature stack")?;
        let points = read_points(&config.roi_points)
            .with_context(|| format!("Failed to read points {}", config.roi_points.display()))?;

        let trained = train_and_evaluate(&stack, &points, &config.classification)
            .with_context(|| format!("Classifier training failed for {}", year))?;
        println!("\n=== Accuracy, {} ===", year);
        print!("{}", trained.report);

        let classes = classify_stack(&stack, &trained.forest)?;
        let mask = self
            .catalog
            .image(&config.land_mask.image)?
            .read_band(&config.land_mask.band)?
            .clip(&config.extent)?;
        let map = postprocess(&classes, &mask).context("Post-processing failed")?;

        let description = format!("Classification_{}_{}", config.site, year);
        let export = ExportParams::new(&description, &config.export_folder, config.extent)
            .with_scale(config.scale)
            .with_max_pixels(config.max_pixels);
        let pb = spinner("Writing output...");
        let map_path = export_raster(&map, &export).context("Failed to export classified map")?;

        let folder: &Path = &config.export_folder;
        let accuracy = folder.join(format!("{}_accuracy.json", description));
        fs::write(&accuracy, trained.report.to_json()?)?;
        let model = folder.join(format!("{}_model.json", description));
        trained.forest.save(&model)?;
        if config.quicklooks {
            let rgba = classes_to_rgba(&map);
            let (rows, cols) = map.shape();
            let path = folder.join(format!("{}_quicklook.tif", description));
            write_rgba_geotiff(&rgba, rows, cols, map.transform(), map.crs(), path)?;
        }
        pb.finish_and_clear();

        Ok(ClassificationOutputs {
            year,
            map: map_path,
            accuracy,
            model,
            report: trained.report,
        })
    }

    /// Every composite, then every year with both composites.
    pub fn run(&self) -> Result<Vec<ClassificationOutputs>> {
        for epoch in &self.config.optical {
            self.build_optical(epoch.year)?;
        }
        for epoch in &self.config.radar {
            self.build_radar(epoch.year)?;
        }
        self.config
            .years()
            .into_iter()
            .map(|year| self.classify(year))
            .collect()
    }
}
