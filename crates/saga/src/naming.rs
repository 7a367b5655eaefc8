//! Name sanitizing and SAGA-to-host name decoration.

/// Characters allowed in algorithm ids and exported file names.
fn is_valid_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == ':'
}

/// Keep only `[A-Za-z0-9:]`.
pub fn sanitize(name: &str) -> String {
    name.chars().filter(|c| is_valid_name_char(*c)).collect()
}

/// Base name for an exported layer file; never empty.
pub fn export_basename(name: &str) -> String {
    let clean = sanitize(name);
    if clean.is_empty() {
        "layer".to_string()
    } else {
        clean
    }
}

/// Algorithm id: lower-cased, sanitized display name.
pub fn algorithm_id(display_name: &str) -> String {
    sanitize(&display_name.to_lowercase())
}

/// User-facing group names for SAGA tool libraries.
const GROUPS: &[(&str, &str)] = &[
    ("contrib_perego", "Image analysis"),
    ("grid_analysis", "Raster analysis"),
    ("grid_calculus", "Raster calculus"),
    ("grid_calculus_bsl", "Raster calculus"),
    ("grid_discretisation", "Raster analysis"),
    ("grid_filter", "Raster filter"),
    ("grid_gridding", "Raster creation tools"),
    ("grid_spline", "Raster creation tools"),
    ("grid_tools", "Raster tools"),
    ("grid_visualisation", "Raster visualization"),
    ("imagery_classification", "Image analysis"),
    ("imagery_rga", "Image analysis"),
    ("imagery_segmentation", "Image analysis"),
    ("imagery_tools", "Image analysis"),
    ("io_gdal", "I/O"),
    ("io_grid_image", "I/O"),
    ("pj_proj4", "Projections"),
    ("shapes_grid", "Vector <-> raster"),
    ("shapes_lines", "Vector line tools"),
    ("shapes_points", "Vector point tools"),
    ("shapes_polygons", "Vector polygon tools"),
    ("shapes_tools", "Vector general tools"),
    ("shapes_transect", "Vector general tools"),
    ("sim_cellular_automata", "Simulation"),
    ("sim_hydrology", "Simulation"),
    ("statistics_grid", "Geostatistics"),
    ("statistics_kriging", "Kriging"),
    ("statistics_points", "Geostatistics"),
    ("statistics_regression", "Geostatistics"),
    ("ta_channels", "Terrain Analysis - Channels"),
    ("ta_compound", "Terrain Analysis - Morphometry"),
    ("ta_hydrology", "Terrain Analysis - Hydrology"),
    ("ta_lighting", "Terrain Analysis - Lighting"),
    ("ta_morphometry", "Terrain Analysis - Morphometry"),
    ("ta_preprocessor", "Terrain Analysis - Hydrology"),
    ("ta_profiles", "Terrain Analysis - Profiles"),
    ("table_calculus", "Table tools"),
    ("table_tools", "Table tools"),
    ("tin_tools", "TIN tools"),
];

/// Map a SAGA library name to the group shown to users.
pub fn decorated_group_name(library: &str) -> String {
    GROUPS
        .iter()
        .find(|(lib, _)| *lib == library)
        .map(|(_, group)| group.to_string())
        .unwrap_or_else(|| library.to_string())
}

/// SAGA vocabulary to host vocabulary, applied on whole words.
const WORDS: &[(&str, &str)] = &[
    ("Grid", "Raster"),
    ("Grids", "Rasters"),
    ("grid", "raster"),
    ("grids", "rasters"),
    ("Shapes", "Vector"),
    ("shapes", "vector"),
];

/// Rename an algorithm using host vocabulary (`Grid` -> `Raster`, ...).
pub fn decorated_algorithm_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut word = String::new();
    for c in name.chars() {
        if c.is_alphanumeric() {
            word.push(c);
        } else {
            out.push_str(&decorate_word(&word));
            word.clear();
            out.push(c);
        }
    }
    out.push_str(&decorate_word(&word));
    out
}

fn decorate_word(word: &str) -> String {
    WORDS
        .iter()
        .find(|(from, _)| *from == word)
        .map(|(_, to)| to.to_string())
        .unwrap_or_else(|| word.to_string())
}
