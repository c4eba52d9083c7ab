//! Discovery of the rasters ODM writes into a project directory.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{info, warn};

/// Orthophoto subdirectory of an ODM project.
pub const ORTHOPHOTO_DIR: &str = "odm_orthophoto";
/// Orthophoto file name.
pub const ORTHOPHOTO_FILE: &str = "odm_orthophoto.tif";
/// Elevation model subdirectory of an ODM project.
pub const DEM_DIR: &str = "odm_dem";
/// Digital surface model file name.
pub const DSM_FILE: &str = "dsm.tif";
/// Digital terrain model file name.
pub const DTM_FILE: &str = "dtm.tif";

/// Which elevation variant was found
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ElevationKind {
    /// `odm_dem/dsm.tif`
    Dsm,
    /// `odm_dem/dtm.tif`, used when no DSM exists
    Dtm,
    /// `odm_orthophoto/dsm.tif`, used when `odm_dem` is missing
    DsmInOrthophotoDir,
}

/// A discovered elevation raster
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ElevationRaster {
    /// Raster path
    pub path: PathBuf,
    /// Variant found
    pub kind: ElevationKind,
}

/// Rasters located in an ODM project directory; either may be missing
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OdmOutputs {
    /// Orthophoto mosaic
    pub orthophoto: Option<PathBuf>,
    /// Surface or terrain elevation model
    pub elevation: Option<ElevationRaster>,
}

/// Locate the orthophoto and elevation rasters in `project_dir`.
pub fn find_odm_results(project_dir: &Path) -> OdmOutputs {
    let ortho_dir = project_dir.join(ORTHOPHOTO_DIR);
    let dem_dir = project_dir.join(DEM_DIR);

    OdmOutputs {
        orthophoto: find_orthophoto(project_dir, &ortho_dir),
        elevation: find_elevation(project_dir, &ortho_dir, &dem_dir),
    }
}

fn find_orthophoto(project_dir: &Path, ortho_dir: &Path) -> Option<PathBuf> {
    if !ortho_dir.is_dir() {
        warn!(
            "{} folder not found in {}",
            ORTHOPHOTO_DIR,
            project_dir.display()
        );
        return None;
    }

    let ortho = ortho_dir.join(ORTHOPHOTO_FILE);
    if ortho.is_file() {
        info!("Found ODM orthophoto: {}", ortho.display());
        Some(ortho)
    } else {
        warn!("{} not found in {}", ORTHOPHOTO_FILE, ortho_dir.display());
        None
    }
}

fn find_elevation(project_dir: &Path, ortho_dir: &Path, dem_dir: &Path) -> Option<ElevationRaster> {
    let found = |path: PathBuf, kind| Some(ElevationRaster { path, kind });

    if dem_dir.is_dir() {
        let dsm = dem_dir.join(DSM_FILE);
        if dsm.is_file() {
            info!("Found ODM DSM: {}", dsm.display());
            return found(dsm, ElevationKind::Dsm);
        }
        let dtm = dem_dir.join(DTM_FILE);
        if dtm.is_file() {
            info!("Found ODM DTM (used as DSM): {}", dtm.display());
            return found(dtm, ElevationKind::Dtm);
        }
        warn!(
            "Neither {} nor {} found in {}",
            DSM_FILE,
            DTM_FILE,
            dem_dir.display()
        );
        return None;
    }

    let dsm_in_ortho = ortho_dir.join(DSM_FILE);
    if dsm_in_ortho.is_file() {
        info!("Found ODM DSM in {}: {}", ORTHOPHOTO_DIR, dsm_in_ortho.display());
        return found(dsm_in_ortho, ElevationKind::DsmInOrthophotoDir);
    }

    warn!(
        "{} folder not found in {}, no DSM available",
        DEM_DIR,
        project_dir.display()
    );
    None
}
