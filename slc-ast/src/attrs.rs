// Declaration and statement attributes

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Shader pipeline stage of an entry point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShaderStage {
    Vertex,
    Fragment,
    Compute,
}

/// System-value semantics attachable to entry parameters and return values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SemanticType {
    Position,
    ClipDistance,
    CullDistance,

    RenderTarget0,
    RenderTarget1,
    RenderTarget2,
    RenderTarget3,
    RenderTarget4,
    RenderTarget5,
    RenderTarget6,
    RenderTarget7,

    Depth,
    DepthGreaterEqual,
    DepthLessEqual,
    StencilRef,

    VertexID,
    InstanceID,

    PrimitiveID,
    IsFrontFace,
    SampleIndex,
    SampleMask,
    Barycentrics,

    ThreadID,
    GroupID,
    ThreadPositionInGroup,
    ThreadIndexInGroup,

    ViewID,
}

impl FromStr for SemanticType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        use SemanticType::*;
        Ok(match s {
            "Position" => Position,
            "ClipDistance" => ClipDistance,
            "CullDistance" => CullDistance,
            "RenderTarget0" => RenderTarget0,
            "RenderTarget1" => RenderTarget1,
            "RenderTarget2" => RenderTarget2,
            "RenderTarget3" => RenderTarget3,
            "RenderTarget4" => RenderTarget4,
            "RenderTarget5" => RenderTarget5,
            "RenderTarget6" => RenderTarget6,
            "RenderTarget7" => RenderTarget7,
            "Depth" => Depth,
            "DepthGreaterEqual" => DepthGreaterEqual,
            "DepthLessEqual" => DepthLessEqual,
            "StencilRef" => StencilRef,
            "VertexID" => VertexID,
            "InstanceID" => InstanceID,
            "PrimitiveID" => PrimitiveID,
            "IsFrontFace" => IsFrontFace,
            "SampleIndex" => SampleIndex,
            "SampleMask" => SampleMask,
            "Barycentrics" => Barycentrics,
            "ThreadID" => ThreadID,
            "GroupID" => GroupID,
            "ThreadPositionInGroup" => ThreadPositionInGroup,
            "ThreadIndexInGroup" => ThreadIndexInGroup,
            "ViewID" => ViewID,
            _ => return Err(()),
        })
    }
}

/// Interpolation mode of a stage-inout field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[allow(non_camel_case_types)]
pub enum InterpolationMode {
    linear,
    nointerpolation,
    centroid,
    sample,
    noperspective,
}

impl FromStr for InterpolationMode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        use InterpolationMode::*;
        Ok(match s {
            "linear" => linear,
            "nointerpolation" => nointerpolation,
            "centroid" => centroid,
            "sample" => sample,
            "noperspective" => noperspective,
            _ => return Err(()),
        })
    }
}

/// The closed attribute set carried by declarations and statements
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Attr {
    Stage(ShaderStage),
    KernelSize { x: u32, y: u32, z: u32 },
    /// Resource binding request; either component may be left for the
    /// allocator to fill in
    ResourceBind {
        group: Option<u32>,
        binding: Option<u32>,
    },
    PushConstant,
    /// Marks a structure as a stage input/output record
    StageInout,
    Semantic(SemanticType),
    Interpolation(InterpolationMode),
    Loop,
    Unroll { count: Option<u32> },
    Branch,
    Flatten,
}
