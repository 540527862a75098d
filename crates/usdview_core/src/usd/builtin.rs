//! Scene shown when the viewer is launched without a stage.

/// Two animated cubes under `/Geometry`, a dome light and a distant light,
/// five seconds of animation at 24 fps.
pub const DEFAULT_SCENE: &str = r#"#usda 1.0
(
    defaultPrim = "Geometry"
    doc = "usdview default scene"
    endTimeCode = 120
    framesPerSecond = 24
    startTimeCode = 0
    timeCodesPerSecond = 24
    upAxis = "Y"
)

def "World"
{
    def DomeLight "DefaultDomeLight"
    {
    }

    def DistantLight "DistantLight"
    {
        float3 xformOp:rotateXYZ = (-45, -30, 0)
        uniform token[] xformOpOrder = ["xformOp:rotateXYZ"]
    }
}

def Xform "Geometry"
{
    double3 xformOp:translate = (0, 0, 0)
    float3 xformOp:scale = (1, 1, 1)
    uniform token[] xformOpOrder = ["xformOp:translate", "xformOp:scale"]

    def Mesh "SubdividedCube"
    {
        int[] faceVertexCounts = [4, 4, 4, 4, 4, 4]
        int[] faceVertexIndices = [4, 5, 6, 7, 1, 0, 3, 2, 3, 7, 6, 2, 0, 1, 5, 4, 1, 2, 6, 5, 0, 4, 7, 3]
        point3f[] points = [
            (-0.5, -0.5, -0.5), (0.5, -0.5, -0.5), (0.5, 0.5, -0.5), (-0.5, 0.5, -0.5),
            (-0.5, -0.5, 0.5), (0.5, -0.5, 0.5), (0.5, 0.5, 0.5), (-0.5, 0.5, 0.5)
        ]
        uniform token subdivisionScheme = "catmullClark"
        double3 xformOp:translate = (-1.5, 0, 0)
        float xformOp:rotateY.timeSamples = {
            0: 0,
            120: 360,
        }
        uniform token[] xformOpOrder = ["xformOp:translate", "xformOp:rotateY"]
    }

    def Cube "Cube"
    {
        double3 xformOp:translate = (1.5, 0, 0)
        float xformOp:rotateX.timeSamples = {
            0: 0,
            120: -360,
        }
        double3 xformOp:translate:bounce.timeSamples = {
            0: (0, 0, 0),
            30: (0, 0.5, 0),
            60: (0, 0, 0),
            90: (0, 0.5, 0),
            120: (0, 0, 0),
        }
        uniform token[] xformOpOrder = ["xformOp:translate", "xformOp:rotateX", "xformOp:translate:bounce"]
    }
}
"#;
