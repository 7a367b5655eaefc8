//! Pre-flight checks on parameter values.

use sagabridge_core::Extent;
use tracing::debug;

use crate::context::ProcessingContext;
use crate::descriptor::AlgorithmDescriptor;
use crate::error::{Result, SagaError};
use crate::parameter::{supplied, LayerType, ParameterKind, Parameters};

/// Reject runs SAGA cannot handle before anything is exported.
///
/// Raster inputs must be single-band and, unless the tool allows it, share
/// one grid (same extent and cell counts). Inputs the host cannot resolve
/// are skipped. Required inputs must have a value.
pub fn check_parameter_values(
    descriptor: &AlgorithmDescriptor,
    parameters: &Parameters,
    context: &dyn ProcessingContext,
) -> Result<()> {
    let mut reference: Option<(Extent, usize, usize)> = None;

    for param in descriptor.inputs() {
        let is_raster = matches!(
            param.kind,
            ParameterKind::RasterLayer
                | ParameterKind::MultipleLayers {
                    layer_type: LayerType::Raster
                }
        );
        if !is_raster {
            continue;
        }
        let Some(value) = supplied(parameters, &param.name) else {
            continue;
        };

        for source in value.as_layers() {
            let Some(info) = context.raster_info(&source) else {
                debug!(param = %param.name, %source, "raster not resolvable, not checked");
                continue;
            };
            if info.band_count > 1 {
                return Err(SagaError::MultibandUnsupported { layer: info.name });
            }
            if descriptor.allow_nonmatching_grid_extents {
                continue;
            }
            let geometry = info.grid_geometry();
            match &reference {
                None => reference = Some(geometry),
                Some(first) if *first != geometry => return Err(SagaError::ExtentMismatch),
                Some(_) => {}
            }
        }
    }

    for param in descriptor.inputs() {
        if !param.optional && supplied(parameters, &param.name).is_none() {
            return Err(SagaError::MissingParameter(param.name.clone()));
        }
    }

    Ok(())
}
