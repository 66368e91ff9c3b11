//! GLSL 330 sources for the built-in Blinn-Phong forward shader.

use crate::light::MAX_LIGHTS_PER_KIND;

pub fn standard_vertex_source() -> String {
    r#"#version 330 core

layout(location = 0) in vec3 a_Position;
layout(location = 1) in vec3 a_Normal;

uniform mat4 u_ViewProjection;
uniform mat4 u_Transform;

out vec3 v_WorldPosition;
out vec3 v_Normal;

void main()
{
    vec4 world = u_Transform * vec4(a_Position, 1.0);
    v_WorldPosition = world.xyz;
    v_Normal = mat3(transpose(inverse(u_Transform))) * a_Normal;
    gl_Position = u_ViewProjection * world;
}
"#
    .to_string()
}

pub fn standard_fragment_source() -> String {
    format!(
        r#"#version 330 core

#define MAX_LIGHTS {max_lights}

struct Material
{{
    vec4 color;
    float shininess;
    float metallic;
    float roughness;
}};

struct DirectionalLight
{{
    vec3 direction;
    vec3 color;
    float intensity;
}};

struct PointLight
{{
    vec3 position;
    vec3 color;
    float intensity;
    float constant;
    float linear;
    float quadratic;
}};

struct SpotLight
{{
    vec3 position;
    vec3 direction;
    vec3 color;
    float intensity;
    float innerCutOff;
    float outerCutOff;
}};

in vec3 v_WorldPosition;
in vec3 v_Normal;

uniform vec3 u_CameraPosition;
uniform Material u_Material;
uniform DirectionalLight u_DirectionalLights[MAX_LIGHTS];
uniform PointLight u_PointLights[MAX_LIGHTS];
uniform SpotLight u_SpotLights[MAX_LIGHTS];
uniform int u_DirectionalLightCount;
uniform int u_PointLightCount;
uniform int u_SpotLightCount;

out vec4 o_Color;

vec3 shade(vec3 lightDir, vec3 normal, vec3 viewDir, vec3 radiance)
{{
    float diffuse = max(dot(normal, lightDir), 0.0);
    vec3 halfway = normalize(lightDir + viewDir);
    float gloss = u_Material.shininess * (1.0 - u_Material.roughness * 0.5);
    float specular = pow(max(dot(normal, halfway), 0.0), max(gloss, 1.0));
    vec3 specularColor = mix(vec3(0.04), u_Material.color.rgb, u_Material.metallic);
    return radiance * (diffuse * u_Material.color.rgb + specular * specularColor);
}}

void main()
{{
    vec3 normal = normalize(v_Normal);
    vec3 viewDir = normalize(u_CameraPosition - v_WorldPosition);
    vec3 result = 0.1 * u_Material.color.rgb;

    for (int i = 0; i < u_DirectionalLightCount; i++)
    {{
        DirectionalLight light = u_DirectionalLights[i];
        result += shade(normalize(-light.direction), normal, viewDir, light.color * light.intensity);
    }}

    for (int i = 0; i < u_PointLightCount; i++)
    {{
        PointLight light = u_PointLights[i];
        float distance = length(light.position - v_WorldPosition);
        float attenuation = 1.0 / (light.constant + light.linear * distance + light.quadratic * distance * distance);
        vec3 lightDir = normalize(light.position - v_WorldPosition);
        result += shade(lightDir, normal, viewDir, light.color * light.intensity * attenuation);
    }}

    for (int i = 0; i < u_SpotLightCount; i++)
    {{
        SpotLight light = u_SpotLights[i];
        vec3 lightDir = normalize(light.position - v_WorldPosition);
        float theta = dot(lightDir, normalize(-light.direction));
        float epsilon = light.innerCutOff - light.outerCutOff;
        float cone = clamp((theta - light.outerCutOff) / epsilon, 0.0, 1.0);
        result += shade(lightDir, normal, viewDir, light.color * light.intensity * cone);
    }}

    o_Color = vec4(result, u_Material.color.a);
}}
"#,
        max_lights = MAX_LIGHTS_PER_KIND
    )
}
