//! CSV ingestion for the four fact sources.
//!
//! The knowledge base is loaded once, at process start, from:
//! - crop/residue properties (`crop_data.csv`)
//! - soil retention properties (`soil_data.csv`)
//! - regional policy (`policy_data.csv`)
//! - regional production/capacity limits (`capacity_data.csv`)
//!
//! Policy and capacity rows for the same region merge into one record.
//! Numeric cells that are blank or unparsable load as `None`; absence
//! must stay observable downstream. Rows with a blank primary key are
//! skipped.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::info;

use residua_core::store::{CropFacts, RegionFacts, SoilFacts};

/// Ingestion errors. These are startup failures: the store is a
/// prerequisite for serving requests.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

/// The three loaded fact tables.
#[derive(Debug, Default)]
pub struct FactTables {
    pub crops: Vec<CropFacts>,
    pub soils: Vec<SoilFacts>,
    pub regions: Vec<RegionFacts>,
}

#[derive(Debug, Deserialize)]
struct CropRow {
    #[serde(rename = "Crop")]
    crop: String,
    #[serde(rename = "Residue_Type")]
    residue_type: String,
    #[serde(rename = "Residue_Factor", default)]
    residue_factor: String,
    #[serde(rename = "N_pct", default)]
    n_pct: String,
    #[serde(rename = "P_pct", default)]
    p_pct: String,
    #[serde(rename = "K_pct", default)]
    k_pct: String,
    #[serde(rename = "Common_Use", default)]
    common_use: String,
}

#[derive(Debug, Deserialize)]
struct SoilRow {
    #[serde(rename = "Soil_Type")]
    soil_type: String,
    #[serde(rename = "Retention_Capacity", default)]
    retention_capacity: String,
}

#[derive(Debug, Deserialize)]
struct PolicyRow {
    #[serde(rename = "Region")]
    region: String,
    #[serde(rename = "Burning_Ban", default)]
    burning_ban: String,
    #[serde(rename = "Compost_Subsidy_INR_per_t", default)]
    compost_subsidy: String,
    #[serde(rename = "Biogas_Subsidy_pct", default)]
    biogas_subsidy: String,
    #[serde(rename = "CO2_Limit_t_per_ha", default)]
    co2_limit: String,
}

#[derive(Debug, Deserialize)]
struct CapacityRow {
    #[serde(rename = "District")]
    district: String,
    #[serde(rename = "Biogas_Production_Score", default)]
    biogas_score: String,
    #[serde(rename = "Biogas_Limit_Level", default)]
    biogas_level: String,
    #[serde(rename = "Compost_Capacity_t_per_day", default)]
    compost_capacity: String,
    #[serde(rename = "Biochar_Max_pct_reported", default)]
    biochar_max: String,
    #[serde(rename = "Biochar_Potential_Score_0_10", default)]
    biochar_score: String,
    #[serde(rename = "Biochar_Limit_pct", default)]
    biochar_limit: String,
    #[serde(rename = "Biochar_Level", default)]
    biochar_level: String,
}

/// Load all four fact sources.
pub fn load_tables(
    crop_csv: &Path,
    soil_csv: &Path,
    policy_csv: &Path,
    capacity_csv: &Path,
) -> Result<FactTables, IngestError> {
    let crops = load_crops(crop_csv)?;
    let soils = load_soils(soil_csv)?;
    let regions = load_regions(policy_csv, capacity_csv)?;
    info!(
        crops = crops.len(),
        soils = soils.len(),
        regions = regions.len(),
        "fact tables loaded"
    );
    Ok(FactTables {
        crops,
        soils,
        regions,
    })
}

fn read_rows<R: for<'de> Deserialize<'de>>(path: &Path) -> Result<Vec<R>, IngestError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|source| IngestError::Read {
            path: path.to_path_buf(),
            source,
        })?;
    reader
        .deserialize()
        .collect::<Result<Vec<R>, csv::Error>>()
        .map_err(|source| IngestError::Read {
            path: path.to_path_buf(),
            source,
        })
}

fn load_crops(path: &Path) -> Result<Vec<CropFacts>, IngestError> {
    let rows: Vec<CropRow> = read_rows(path)?;
    Ok(rows
        .into_iter()
        .filter(|row| !row.crop.is_empty())
        .map(|row| CropFacts {
            crop: row.crop,
            residue_type: row.residue_type,
            residue_ratio: clean_number(&row.residue_factor),
            nutrient_n: clean_number(&row.n_pct),
            nutrient_p: clean_number(&row.p_pct),
            nutrient_k: clean_number(&row.k_pct),
            common_use: clean_text(row.common_use),
        })
        .collect())
}

fn load_soils(path: &Path) -> Result<Vec<SoilFacts>, IngestError> {
    let rows: Vec<SoilRow> = read_rows(path)?;
    Ok(rows
        .into_iter()
        .filter(|row| !row.soil_type.is_empty())
        .map(|row| SoilFacts {
            soil_type: row.soil_type,
            retention_capacity: clean_text(row.retention_capacity),
        })
        .collect())
}

fn load_regions(policy_csv: &Path, capacity_csv: &Path) -> Result<Vec<RegionFacts>, IngestError> {
    let mut regions: Vec<RegionFacts> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    let policy_rows: Vec<PolicyRow> = read_rows(policy_csv)?;
    for row in policy_rows {
        if row.region.is_empty() {
            continue;
        }
        let entry = region_entry(&mut regions, &mut index, &row.region);
        entry.burning_ban = clean_text(row.burning_ban);
        entry.compost_subsidy_inr_per_ton = clean_number(&row.compost_subsidy);
        entry.biogas_subsidy_pct = clean_number(&row.biogas_subsidy);
        entry.co2_limit_t_per_ha = clean_number(&row.co2_limit);
    }

    let capacity_rows: Vec<CapacityRow> = read_rows(capacity_csv)?;
    for row in capacity_rows {
        if row.district.is_empty() {
            continue;
        }
        let entry = region_entry(&mut regions, &mut index, &row.district);
        entry.biogas_production_score = clean_number(&row.biogas_score);
        entry.biogas_limit_level = clean_text(row.biogas_level);
        entry.compost_capacity_t_per_day = clean_number(&row.compost_capacity);
        entry.biochar_max_pct = clean_number(&row.biochar_max);
        entry.biochar_potential_score = clean_number(&row.biochar_score);
        entry.biochar_limit_pct = clean_number(&row.biochar_limit);
        entry.biochar_level = clean_text(row.biochar_level);
    }

    Ok(regions)
}

fn region_entry<'a>(
    regions: &'a mut Vec<RegionFacts>,
    index: &mut HashMap<String, usize>,
    name: &str,
) -> &'a mut RegionFacts {
    let idx = *index.entry(name.to_string()).or_insert_with(|| {
        regions.push(RegionFacts {
            region: name.to_string(),
            ..RegionFacts::default()
        });
        regions.len() - 1
    });
    &mut regions[idx]
}

fn clean_number(value: &str) -> Option<f64> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse().ok()
}

fn clean_text(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed == "nan" {
        return None;
    }
    Some(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_file(dir: &tempfile::TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).expect("write test csv");
        path
    }

    #[test]
    fn test_load_tables_maps_columns_and_merges_regions() {
        let dir = tempfile::tempdir().expect("tempdir");
        let crop_csv = write_file(
            &dir,
            "crop_data.csv",
            "Crop,Residue_Type,Residue_Factor,N_pct,P_pct,K_pct,Common_Use\n\
             Rice Paddy,Straw,1.5,0.6,0.1,1.5,Mulch; fodder\n\
             ,Orphan,1.0,,,,\n",
        );
        let soil_csv = write_file(
            &dir,
            "soil_data.csv",
            "Soil_Type,Retention_Capacity\nAlluvial,High\nLaterite,\n",
        );
        let policy_csv = write_file(
            &dir,
            "policy_data.csv",
            "Region,Burning_Ban,Compost_Subsidy_INR_per_t,Biogas_Subsidy_pct,CO2_Limit_t_per_ha\n\
             Thanjavur,Yes,500,30,2\n",
        );
        let capacity_csv = write_file(
            &dir,
            "capacity_data.csv",
            "District,Biogas_Production_Score,Biogas_Limit_Level,Compost_Capacity_t_per_day,\
             Biochar_Max_pct_reported,Biochar_Potential_Score_0_10,Biochar_Limit_pct,Biochar_Level\n\
             Thanjavur,6.5,High,120,25,7,20,Medium\n\
             Erode,not-a-number,,,,,15,\n",
        );

        let tables =
            load_tables(&crop_csv, &soil_csv, &policy_csv, &capacity_csv).expect("tables load");

        // Blank-key crop row skipped.
        assert_eq!(tables.crops.len(), 1);
        let crop = &tables.crops[0];
        assert_eq!(crop.crop, "Rice Paddy");
        assert_eq!(crop.residue_ratio, Some(1.5));
        assert_eq!(crop.common_use.as_deref(), Some("Mulch; fodder"));

        // Blank cell loads as None.
        assert_eq!(tables.soils[1].retention_capacity, None);

        // Policy and capacity rows for Thanjavur merged into one record.
        assert_eq!(tables.regions.len(), 2);
        let thanjavur = &tables.regions[0];
        assert_eq!(thanjavur.region, "Thanjavur");
        assert_eq!(thanjavur.burning_ban.as_deref(), Some("Yes"));
        assert_eq!(thanjavur.compost_subsidy_inr_per_ton, Some(500.0));
        assert_eq!(thanjavur.compost_capacity_t_per_day, Some(120.0));
        assert_eq!(thanjavur.biochar_limit_pct, Some(20.0));

        // Capacity-only region still gets a record; junk number -> None.
        let erode = &tables.regions[1];
        assert_eq!(erode.region, "Erode");
        assert_eq!(erode.biogas_production_score, None);
        assert_eq!(erode.biochar_limit_pct, Some(15.0));
        assert_eq!(erode.burning_ban, None);
    }

    #[test]
    fn test_missing_file_is_an_ingest_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let missing = dir.path().join("nope.csv");
        let soil_csv = write_file(&dir, "soil.csv", "Soil_Type,Retention_Capacity\n");

        let err = load_tables(&missing, &soil_csv, &soil_csv, &soil_csv).unwrap_err();
        assert!(matches!(err, IngestError::Read { .. }));
    }
}
